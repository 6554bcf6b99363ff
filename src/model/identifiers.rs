//! Numeric identifier newtypes with smart constructors.
//!
//! Operands arrive as strings (typed by users or decoded from permalinks),
//! so every identifier has a `parse` constructor that rejects empty and
//! non-numeric input instead of guessing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Smart constructor: validates a decimal id string.
    pub fn parse(raw: &str) -> Result<Self, InvalidId> {
        parse_numeric(raw).map(Self)
    }

    /// The raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a channel (stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Smart constructor: validates a decimal id string.
    pub fn parse(raw: &str) -> Result<Self, InvalidId> {
        parse_numeric(raw).map(Self)
    }

    /// The raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Smart constructor: validates a decimal id string.
    pub fn parse(raw: &str) -> Result<Self, InvalidId> {
        parse_numeric(raw).map(Self)
    }

    /// The raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_numeric(raw: &str) -> Result<u64, InvalidId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidId::Empty);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidId::NotNumeric(trimmed.to_string()));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| InvalidId::NotNumeric(trimmed.to_string()))
}

// ===== Error Types =====

/// Rejection reason from the `parse` smart constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidId {
    /// Empty or all-whitespace input.
    #[error("identifier cannot be empty")]
    Empty,
    /// Anything but decimal digits.
    #[error("identifier '{0}' is not a non-negative integer")]
    NotNumeric(String),
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_id_parses_decimal_string() {
        assert_eq!(ChannelId::parse("100"), Ok(ChannelId::new(100)));
    }

    #[test]
    fn channel_id_tolerates_surrounding_whitespace() {
        assert_eq!(ChannelId::parse(" 7 "), Ok(ChannelId::new(7)));
    }

    #[test]
    fn ids_reject_empty_string() {
        assert_eq!(UserId::parse(""), Err(InvalidId::Empty));
        assert_eq!(MessageId::parse("   "), Err(InvalidId::Empty));
    }

    #[test]
    fn ids_reject_names_and_signs() {
        assert!(matches!(
            ChannelId::parse("Denmark"),
            Err(InvalidId::NotNumeric(_))
        ));
        assert!(matches!(
            MessageId::parse("-5"),
            Err(InvalidId::NotNumeric(_))
        ));
        assert!(matches!(
            MessageId::parse("1.5"),
            Err(InvalidId::NotNumeric(_))
        ));
    }

    #[test]
    fn ids_reject_overflow() {
        assert!(UserId::parse("99999999999999999999999").is_err());
    }

    #[test]
    fn display_returns_decimal_form() {
        assert_eq!(MessageId::new(42).to_string(), "42");
        assert_eq!(UserId::new(3).to_string(), "3");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ChannelId::new(5)).expect("serialize");
        assert_eq!(json, "5");
        let back: ChannelId = serde_json::from_str("5").expect("deserialize");
        assert_eq!(back, ChannelId::new(5));
    }
}
