//! Module that contains the token state machine each ring member runs.
//!
//! A member holding only PING may enter its critical section. The PONG token
//! follows PING around the ring; when both meet at a member a new round starts,
//! and when a member sees its own last forwarded value come back without the
//! sibling token it regenerates the sibling.

use crate::{
    channel::TokenChannel,
    config::NodeConfig,
    log,
    poisson::Poisson,
    state::{Held, NodeState},
    sync::LossRequests,
    token::{Token, TokenKind},
};
use color_print::cformat;
use rand::rngs::SmallRng;
use thiserror::Error;
use tokio::{sync::mpsc::UnboundedSender, time::sleep};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RingError {
    /// A token arrived that can't exist if there is a single PING and PONG in the ring.
    #[error("protocol violation: received {token} while holding {held:?}")]
    ProtocolViolation { token: Token, held: Held },
}

/// Enum that represents what happened inside a member, for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingEvent {
    Received(Token),
    Stale(Token),
    Malformed(String),
    /// Both tokens met; carries the new round.
    Incarnated(i64),
    Regenerated(Token),
    EnteredCriticalSection,
    LeftCriticalSection,
    Forwarded(Token),
    Lost(Token),
}

/// Result of one pass through the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Shutdown,
}

pub struct TokenRingMember {
    id: usize,
    state: NodeState,
    channel: TokenChannel,
    losses: LossRequests,
    config: NodeConfig,
    workload: Option<Poisson<SmallRng>>,
    events: Option<UnboundedSender<(usize, RingEvent)>>,
    shutdown: CancellationToken,
}

impl TokenRingMember {
    pub fn new(id: usize, channel: TokenChannel, config: NodeConfig) -> Self {
        let workload = config
            .critical_section_rate
            .map(|rate| Poisson::new(rate, config.seed.unwrap_or_else(rand::random)));

        Self {
            id,
            state: NodeState::new(),
            channel,
            losses: LossRequests::new(),
            config,
            workload,
            events: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, events: UnboundedSender<(usize, RingEvent)>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Handle the fault injector uses to ask for tokens to be lost.
    pub fn loss_requests(&self) -> LossRequests {
        self.losses.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn emit(&self, event: RingEvent) {
        if let Some(events) = &self.events {
            let _ = events.send((self.id, event));
        }
    }

    fn name(&self) -> String {
        cformat!("<bold>node{}</bold>", self.id)
    }

    /// Function that resets the member and, on the initiator, puts the first round in the ring.
    pub async fn initialize(&mut self, is_initiator: bool) {
        self.state = NodeState::new();

        if is_initiator {
            log::info(&format!("{}: First member, initializing tokens", self.name()));
            self.state.store(Token::ping(1));
            self.state.store(Token::pong(-1));
            self.forward(TokenKind::Ping).await;
            self.forward(TokenKind::Pong).await;
        }
    }

    pub async fn request_loss(&self, kind: TokenKind) {
        self.losses.request(kind).await;
    }

    /// Function that decodes a raw arrival and feeds it to the state machine.
    ///
    /// Malformed input is logged and dropped; only protocol violations are returned.
    pub fn on_token_arrived(&mut self, raw: &str) -> Result<(), RingError> {
        match Token::decode(raw) {
            Ok(token) => self.handle_token(token),
            Err(e) => {
                log::error(&format!("{}: {e}", self.name()));
                self.emit(RingEvent::Malformed(raw.to_string()));
                Ok(())
            }
        }
    }

    pub fn handle_token(&mut self, token: Token) -> Result<(), RingError> {
        let watermark = self.state.watermark();

        if token.value.saturating_abs() < watermark {
            log::warn(&format!("{}: Received old token ({token}); deleting", self.name()));
            self.emit(RingEvent::Stale(token));
            return Ok(());
        }

        log::info(&format!("{}: Received token: {token}", self.name()));
        self.emit(RingEvent::Received(token));

        let held = self.state.held();
        if held == Held::Both || held.holds(token.kind) {
            return Err(RingError::ProtocolViolation { token, held });
        }
        self.state.store(token);

        if self.state.held() == Held::Both {
            log::warn(&format!("{}: Tokens met, incarnating", self.name()));
            self.incarnate(token.value);
        } else if token.value == watermark {
            let lost = token.kind.other();
            log::critical(&format!("{}: {lost} token lost, regenerating", self.name()));
            self.regenerate(lost, token.value.saturating_neg());
        }

        Ok(())
    }

    fn regenerate(&mut self, kind: TokenKind, value: i64) {
        let token = Token::new(kind, value);
        self.state.store(token);
        self.emit(RingEvent::Regenerated(token));
    }

    fn incarnate(&mut self, value: i64) {
        let round = value.saturating_abs().saturating_add(1);
        self.state.store(Token::ping(round));
        self.state.store(Token::pong(-round));
        self.emit(RingEvent::Incarnated(round));
    }

    /// Function that passes the held token of `kind` to the next member, or drops it
    /// when a loss was requested for that kind.
    pub async fn forward(&mut self, kind: TokenKind) {
        let Some(token) = self.state.slot(kind) else {
            return;
        };

        self.state.set_watermark(token.value);
        if kind == TokenKind::Pong {
            sleep(self.config.pong_delay()).await;
        }
        self.state.take(kind);

        if self.losses.take(kind).await {
            log::critical(&format!("{}: Lost {kind} token!", self.name()));
            self.emit(RingEvent::Lost(token));
            return;
        }

        match self.channel.send(token.encode()) {
            Ok(()) => {
                log::debug(&format!("{}: Passed {token}", self.name()));
                self.emit(RingEvent::Forwarded(token));
            }
            Err(e) => log::error(&format!("{}: Couldn't pass {token}: {e}", self.name())),
        }
    }

    /// Function that handles a token if one is already waiting, without blocking.
    pub fn try_receive(&mut self) -> Result<bool, RingError> {
        match self.channel.try_receive() {
            Some(raw) => {
                self.on_token_arrived(&raw)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn critical_section(&mut self) {
        let cap = self.config.critical_section();
        let duration = match self.workload.as_mut() {
            Some(poisson) => poisson.capped_duration(cap),
            None => cap,
        };

        log::warn(&format!("{}: Entering critical section", self.name()));
        self.emit(RingEvent::EnteredCriticalSection);
        sleep(duration).await;
        log::warn(&format!("{}: Leaving critical section", self.name()));
        self.emit(RingEvent::LeftCriticalSection);
    }

    /// Function that runs one pass of the main loop, dispatching on the held tokens.
    pub async fn step(&mut self) -> Result<Step, RingError> {
        if self.shutdown.is_cancelled() {
            return Ok(Step::Shutdown);
        }

        match self.state.held() {
            Held::None => {
                let raw = tokio::select! {
                    _ = self.shutdown.cancelled() => return Ok(Step::Shutdown),
                    raw = self.channel.receive() => raw,
                };

                match raw {
                    Some(raw) => self.on_token_arrived(&raw)?,
                    None => {
                        log::error(&format!("{}: The previous member is gone.", self.name()));
                        return Ok(Step::Shutdown);
                    }
                }
            }
            Held::PingOnly => {
                self.critical_section().await;
                // a PONG that arrived meanwhile must be seen before PING leaves
                if !self.try_receive()? {
                    self.forward(TokenKind::Ping).await;
                }
            }
            Held::PongOnly => self.forward(TokenKind::Pong).await,
            Held::Both => {
                self.forward(TokenKind::Ping).await;
                self.forward(TokenKind::Pong).await;
            }
        }

        Ok(Step::Continue)
    }

    /// Function that runs the member until shutdown is requested or a protocol violation occurs.
    pub async fn run(&mut self) -> Result<(), RingError> {
        let result = loop {
            match self.step().await {
                Ok(Step::Continue) => {}
                Ok(Step::Shutdown) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        log::info(&format!("{}: Cleaning up and exiting", self.name()));
        self.channel.close();
        result
    }
}
