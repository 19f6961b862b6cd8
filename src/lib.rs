pub mod channel;
pub mod config;
#[cfg(unix)]
pub mod fault;
pub mod log;
pub mod member;
pub mod poisson;
pub mod state;
pub mod sync;
pub mod token;
pub mod topology;
pub mod transport;

pub use channel::{ChannelError, TokenChannel};
pub use config::{ConfigError, NodeConfig};
pub use member::{RingError, RingEvent, Step, TokenRingMember};
pub use state::{Held, NodeState};
pub use sync::LossRequests;
pub use token::{Token, TokenError, TokenKind};
pub use topology::{Topology, TopologyError};
pub use transport::{Transport, TransportError};

/// Port members listen on for their previous member when the hosts list names no port.
pub const DEFAULT_PORT: u16 = 7070;
