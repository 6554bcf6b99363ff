//! Search terms: one `{operator, operand, negated}` clause of a narrow.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ===== Operator =====

/// Operator of a search term.
///
/// Closed vocabulary of canonical operator names with a fallback for
/// anything else. Legacy aliases (`stream`, `pm-with`, ...) are NOT mapped
/// here; they land in `Other` until passed through
/// [`canonicalize_operator`](crate::parser::canonical::canonicalize_operator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    /// `channel:` a channel id or name.
    Channel,
    /// `channels:public` / `channels:web-public`.
    Channels,
    /// `topic:` a topic name within the channel.
    Topic,
    /// `sender:` an email.
    Sender,
    /// `dm:` comma-separated emails of the other participants.
    Dm,
    /// `dm-including:` DMs whose participants include an email.
    DmIncluding,
    /// `is:` a message flag or conversation state.
    Is,
    /// `has:` link, image, attachment or reaction.
    Has,
    /// `in:home` / `in:all`.
    In,
    /// `near:` anchor message id; does not restrict matches.
    Near,
    /// `id:` one message.
    Id,
    /// `with:` permalink anchor that follows the message if it moves.
    With,
    /// Free-text keywords.
    Search,
    /// Unknown or legacy operator name, stored as given.
    Other(String),
}

impl Operator {
    /// Map an exact canonical name to its variant.
    pub fn from_canonical(name: &str) -> Self {
        match name {
            "channel" => Self::Channel,
            "channels" => Self::Channels,
            "topic" => Self::Topic,
            "sender" => Self::Sender,
            "dm" => Self::Dm,
            "dm-including" => Self::DmIncluding,
            "is" => Self::Is,
            "has" => Self::Has,
            "in" => Self::In,
            "near" => Self::Near,
            "id" => Self::Id,
            "with" => Self::With,
            "search" => Self::Search,
            other => Self::Other(other.to_string()),
        }
    }

    /// The canonical name, or the stored name for `Other`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Channel => "channel",
            Self::Channels => "channels",
            Self::Topic => "topic",
            Self::Sender => "sender",
            Self::Dm => "dm",
            Self::DmIncluding => "dm-including",
            Self::Is => "is",
            Self::Has => "has",
            Self::In => "in",
            Self::Near => "near",
            Self::Id => "id",
            Self::With => "with",
            Self::Search => "search",
            Self::Other(name) => name,
        }
    }

    /// Whether this is a member of the canonical vocabulary.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Operators whose operands are comma-separated user emails.
    pub fn is_user_operator(&self) -> bool {
        matches!(self, Self::Dm | Self::DmIncluding | Self::Sender)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        Self::from_canonical(name)
    }
}

impl Serialize for Operator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_canonical(&name))
    }
}

// ===== Term =====

/// One clause of a narrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    /// What the term tests.
    pub operator: Operator,
    /// Argument; numbers in JSON are accepted and stringified.
    #[serde(deserialize_with = "operand_from_string_or_number")]
    pub operand: String,
    /// Written with a leading `-`.
    #[serde(default)]
    pub negated: bool,
}

impl Term {
    /// A positive term. `&str` operators map through `Operator::from_canonical`.
    pub fn new(operator: impl Into<Operator>, operand: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            operand: operand.into(),
            negated: false,
        }
    }

    /// A negated term.
    pub fn negated(operator: impl Into<Operator>, operand: impl Into<String>) -> Self {
        Self {
            negated: true,
            ..Self::new(operator, operand)
        }
    }
}

/// Operands may arrive as JSON numbers (ids from older clients).
fn operand_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawOperand {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Flag(bool),
    }

    Ok(match RawOperand::deserialize(deserializer)? {
        RawOperand::Text(text) => text,
        RawOperand::Unsigned(n) => n.to_string(),
        RawOperand::Signed(n) => n.to_string(),
        RawOperand::Float(n) => n.to_string(),
        RawOperand::Flag(b) => b.to_string(),
    })
}
