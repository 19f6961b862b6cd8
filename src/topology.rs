//! Module that works out a member's place in the ring from a hosts list.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("no ring members found for prefix {prefix:?}")]
    Empty { prefix: String },

    #[error("member id {id} is outside the ring of {len} members (ids start at 1)")]
    IdOutOfRange { id: usize, len: usize },
}

/// Struct that holds the ordered ring members and this member's 1-based ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    members: Vec<String>,
    id: usize,
}

impl Topology {
    pub fn new(members: Vec<String>, id: usize) -> Result<Self, TopologyError> {
        if members.is_empty() {
            return Err(TopologyError::Empty {
                prefix: String::new(),
            });
        }
        if id == 0 || id > members.len() {
            return Err(TopologyError::IdOutOfRange {
                id,
                len: members.len(),
            });
        }
        Ok(Self { members, id })
    }

    /// Function that reads `<address> <name> ...` lines, keeping the names of the addresses
    /// that start with `prefix`, in file order.
    pub fn from_hosts(hosts: &str, prefix: &str, id: usize) -> Result<Self, TopologyError> {
        let members: Vec<String> = hosts
            .lines()
            .filter(|line| line.starts_with(prefix))
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(str::to_string)
            .collect();

        if members.is_empty() {
            return Err(TopologyError::Empty {
                prefix: prefix.to_string(),
            });
        }
        Self::new(members, id)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// The member this one forwards tokens to.
    pub fn successor(&self) -> &str {
        &self.members[self.id % self.members.len()]
    }

    pub fn is_initiator(&self) -> bool {
        self.id == 1
    }

    /// Function that returns the successor's address, appending `port` unless one is given.
    pub fn successor_address(&self, port: u16) -> String {
        let successor = self.successor();
        if successor.contains(':') {
            successor.to_string()
        } else {
            format!("{successor}:{port}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOSTS: &str = "127.0.0.1 localhost\n\
                         192.168.10.2 node1 node1\n\
                         192.168.10.3 node2\n\
                         10.0.2.15 vagrant\n\
                         192.168.10.4 node3\n";

    #[test]
    fn reads_members_in_file_order() {
        let topology = Topology::from_hosts(HOSTS, "192.168.10.", 1).unwrap();
        assert_eq!(topology.members(), ["node1", "node2", "node3"]);
        assert!(topology.is_initiator());
        assert_eq!(topology.successor(), "node2");
    }

    #[test]
    fn last_member_wraps_to_first() {
        let topology = Topology::from_hosts(HOSTS, "192.168.10.", 3).unwrap();
        assert!(!topology.is_initiator());
        assert_eq!(topology.successor(), "node1");
        assert_eq!(topology.successor_address(7000), "node1:7000");
    }

    #[test]
    fn explicit_ports_are_kept() {
        let members = vec!["127.0.0.1:7001".to_string(), "127.0.0.1:7002".to_string()];
        let topology = Topology::new(members, 1).unwrap();
        assert_eq!(topology.successor_address(7000), "127.0.0.1:7002");
    }

    #[test]
    fn rejects_bad_rings() {
        assert_eq!(
            Topology::from_hosts(HOSTS, "172.16.", 1),
            Err(TopologyError::Empty {
                prefix: "172.16.".to_string()
            })
        );
        assert_eq!(
            Topology::from_hosts(HOSTS, "192.168.10.", 4),
            Err(TopologyError::IdOutOfRange { id: 4, len: 3 })
        );
        assert!(matches!(
            Topology::from_hosts(HOSTS, "192.168.10.", 0),
            Err(TopologyError::IdOutOfRange { .. })
        ));
    }
}
