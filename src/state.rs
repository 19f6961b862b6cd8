//! Module that contains the per-member token bookkeeping.

use crate::token::{Token, TokenKind};

/// Enum that tells which tokens a member is currently holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Held {
    None,
    PingOnly,
    PongOnly,
    Both,
}

impl Held {
    fn from_slots(ping: bool, pong: bool) -> Self {
        match (ping, pong) {
            (false, false) => Self::None,
            (true, false) => Self::PingOnly,
            (false, true) => Self::PongOnly,
            (true, true) => Self::Both,
        }
    }

    pub fn holds(self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::Ping => matches!(self, Self::PingOnly | Self::Both),
            TokenKind::Pong => matches!(self, Self::PongOnly | Self::Both),
        }
    }

    pub fn with(self, kind: TokenKind) -> Self {
        match kind {
            TokenKind::Ping => Self::from_slots(true, self.holds(TokenKind::Pong)),
            TokenKind::Pong => Self::from_slots(self.holds(TokenKind::Ping), true),
        }
    }

    pub fn without(self, kind: TokenKind) -> Self {
        match kind {
            TokenKind::Ping => Self::from_slots(false, self.holds(TokenKind::Pong)),
            TokenKind::Pong => Self::from_slots(self.holds(TokenKind::Ping), false),
        }
    }
}

/// Struct that represents the token state of a single ring member.
///
/// `held()` is read off the two slots, so the held mask can never disagree
/// with slot occupancy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeState {
    watermark: i64,
    ping: Option<Token>,
    pong: Option<Token>,
}

impl NodeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the last token this member forwarded.
    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    pub fn set_watermark(&mut self, value: i64) {
        self.watermark = value;
    }

    pub fn held(&self) -> Held {
        Held::from_slots(self.ping.is_some(), self.pong.is_some())
    }

    pub fn slot(&self, kind: TokenKind) -> Option<Token> {
        match kind {
            TokenKind::Ping => self.ping,
            TokenKind::Pong => self.pong,
        }
    }

    /// Function that puts a token in the slot of its kind, replacing whatever was there.
    pub fn store(&mut self, token: Token) {
        let expected = self.held().with(token.kind);
        match token.kind {
            TokenKind::Ping => self.ping = Some(token),
            TokenKind::Pong => self.pong = Some(token),
        }
        debug_assert_eq!(self.held(), expected);
    }

    /// Function that empties the slot of the given kind.
    pub fn take(&mut self, kind: TokenKind) -> Option<Token> {
        let expected = self.held().without(kind);
        let token = match kind {
            TokenKind::Ping => self.ping.take(),
            TokenKind::Pong => self.pong.take(),
        };
        debug_assert_eq!(self.held(), expected);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_set_and_clear() {
        assert_eq!(Held::None.with(TokenKind::Ping), Held::PingOnly);
        assert_eq!(Held::PingOnly.with(TokenKind::Pong), Held::Both);
        assert_eq!(Held::Both.without(TokenKind::Ping), Held::PongOnly);
        assert_eq!(Held::PongOnly.without(TokenKind::Pong), Held::None);
        assert_eq!(Held::PingOnly.without(TokenKind::Pong), Held::PingOnly);
        assert!(Held::Both.holds(TokenKind::Ping) && Held::Both.holds(TokenKind::Pong));
        assert!(!Held::None.holds(TokenKind::Ping));
    }

    #[test]
    fn held_follows_slots() {
        let mut state = NodeState::new();
        assert_eq!(state.held(), Held::None);

        state.store(Token::pong(-2));
        assert_eq!(state.held(), Held::PongOnly);

        state.store(Token::ping(2));
        assert_eq!(state.held(), Held::Both);

        assert_eq!(state.take(TokenKind::Pong), Some(Token::pong(-2)));
        assert_eq!(state.held(), Held::PingOnly);
        assert_eq!(state.slot(TokenKind::Pong), None);

        assert_eq!(state.take(TokenKind::Ping), Some(Token::ping(2)));
        assert_eq!(state.held(), Held::None);
        assert_eq!(state.take(TokenKind::Ping), None);
    }

    #[test]
    fn starts_in_round_zero() {
        let state = NodeState::new();
        assert_eq!(state.watermark(), 0);
        assert_eq!(state.slot(TokenKind::Ping), None);
    }
}
