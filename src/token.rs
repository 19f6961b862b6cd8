//! Module that contains the tokens circulating in the ring and their wire format.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Enum that represents the two kinds of token. The discriminant is the wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ping = 1,
    Pong = 2,
}

/// Struct that represents a token sent between ring members.
///
/// Within round `k` the PING token carries `k` and the PONG token carries `-k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: i64,
}

/// Errors produced while decoding a token received from the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token {raw:?}: expected 2 space separated fields, found {found}")]
    FieldCount { raw: String, found: usize },

    #[error("malformed token {raw:?}: unknown kind code {code:?}")]
    UnknownKind { raw: String, code: String },

    #[error("malformed token {raw:?}: value {value:?} is not an integer")]
    InvalidValue { raw: String, value: String },
}

impl TokenKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Ping),
            2 => Some(Self::Pong),
            _ => None,
        }
    }

    /// Function that returns the sibling kind.
    pub fn other(self) -> Self {
        match self {
            Self::Ping => Self::Pong,
            Self::Pong => Self::Ping,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping => f.write_str("PING"),
            Self::Pong => f.write_str("PONG"),
        }
    }
}

impl Token {
    pub fn new(kind: TokenKind, value: i64) -> Self {
        Self { kind, value }
    }

    pub fn ping(value: i64) -> Self {
        Self::new(TokenKind::Ping, value)
    }

    pub fn pong(value: i64) -> Self {
        Self::new(TokenKind::Pong, value)
    }

    /// Function that returns the token as a `"<kind code> <value>"` record.
    pub fn encode(&self) -> String {
        format!("{} {}", self.kind.code(), self.value)
    }

    /// Function that parses a token from a `"<kind code> <value>"` record.
    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let fields: Vec<&str> = raw.split(' ').collect();
        let &[code, value] = fields.as_slice() else {
            return Err(TokenError::FieldCount {
                raw: raw.to_string(),
                found: fields.len(),
            });
        };

        let kind = code
            .parse::<u8>()
            .ok()
            .and_then(TokenKind::from_code)
            .ok_or_else(|| TokenError::UnknownKind {
                raw: raw.to_string(),
                code: code.to_string(),
            })?;

        let value = value
            .parse::<i64>()
            .map_err(|_| TokenError::InvalidValue {
                raw: raw.to_string(),
                value: value.to_string(),
            })?;

        Ok(Self { kind, value })
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token ({}, {})", self.kind, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_kind_code_then_value() {
        assert_eq!(Token::ping(3).encode(), "1 3");
        assert_eq!(Token::pong(-3).encode(), "2 -3");
    }

    #[test]
    fn decode_inverts_encode() {
        for token in [Token::ping(1), Token::pong(-1), Token::ping(i64::MAX), Token::pong(0)] {
            assert_eq!(Token::decode(&token.encode()), Ok(token));
        }
        assert_eq!("2 -17".parse::<Token>(), Ok(Token::pong(-17)));
    }

    #[test]
    fn rejects_unknown_kind_codes() {
        assert!(matches!(Token::decode("3 1"), Err(TokenError::UnknownKind { .. })));
        assert!(matches!(Token::decode("0 1"), Err(TokenError::UnknownKind { .. })));
        assert!(matches!(Token::decode("PING 1"), Err(TokenError::UnknownKind { .. })));
    }

    #[test]
    fn rejects_non_integer_values() {
        assert!(matches!(Token::decode("1 x"), Err(TokenError::InvalidValue { .. })));
        assert!(matches!(Token::decode("1 1.5"), Err(TokenError::InvalidValue { .. })));
        assert!(matches!(Token::decode("1 "), Err(TokenError::InvalidValue { .. })));
    }

    #[test]
    fn rejects_wrong_field_counts() {
        assert!(matches!(Token::decode(""), Err(TokenError::FieldCount { found: 1, .. })));
        assert!(matches!(Token::decode("1"), Err(TokenError::FieldCount { found: 1, .. })));
        assert!(matches!(Token::decode("1 2 3"), Err(TokenError::FieldCount { found: 3, .. })));
        assert!(matches!(Token::decode("1  2"), Err(TokenError::FieldCount { found: 3, .. })));
    }

    #[test]
    fn other_kind_is_the_sibling() {
        assert_eq!(TokenKind::Ping.other(), TokenKind::Pong);
        assert_eq!(TokenKind::Pong.other(), TokenKind::Ping);
        assert_eq!(Token::ping(4).to_string(), "Token (PING, 4)");
    }
}
