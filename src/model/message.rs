//! Candidate message attributes consumed by the predicate.
//!
//! Only the fields a narrow can test are modelled; rendering state lives
//! elsewhere.

use crate::model::{ChannelId, MessageId, UserId};
use serde::{Deserialize, Serialize};

// ===== Recipient =====

/// Where a message was sent.
///
/// Serialized with the wire tag `type` (`stream` / `private`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Recipient {
    /// Channel message in a topic.
    #[serde(rename = "stream")]
    Channel {
        /// Channel the message was sent to.
        stream_id: ChannelId,
        /// Topic within the channel.
        topic: String,
    },
    /// Direct message. Lists every participant, the current user included.
    #[serde(rename = "private")]
    Direct {
        /// Participant ids.
        display_recipient: Vec<UserId>,
    },
}

// ===== Reaction =====

/// An emoji reaction after deduplication by emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Emoji name without colons, e.g. `+1`.
    pub emoji_name: String,
    /// Users who reacted with this emoji.
    #[serde(default)]
    pub user_ids: Vec<UserId>,
}

// ===== Message =====

/// A message as cached on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned id.
    pub id: MessageId,
    /// Author.
    pub sender_id: UserId,
    /// Channel/topic or DM participants.
    #[serde(flatten)]
    pub recipient: Recipient,
    /// Server-rendered HTML body.
    #[serde(default)]
    pub content: String,
    /// Starred by the current user.
    #[serde(default)]
    pub starred: bool,
    /// Mentions the current user (directly or via a group).
    #[serde(default)]
    pub mentioned: bool,
    /// Matched one of the current user's alert words.
    #[serde(default)]
    pub alerted: bool,
    /// Not yet read by the current user.
    #[serde(default)]
    pub unread: bool,
    /// Reactions grouped by emoji.
    #[serde(default)]
    pub clean_reactions: Vec<Reaction>,
}

impl Message {
    /// Channel message with empty content and no flags.
    pub fn channel(
        id: MessageId,
        sender_id: UserId,
        stream_id: ChannelId,
        topic: impl Into<String>,
    ) -> Self {
        Self::with_recipient(
            id,
            sender_id,
            Recipient::Channel {
                stream_id,
                topic: topic.into(),
            },
        )
    }

    /// Direct message between `participants` (sender included).
    pub fn direct(id: MessageId, sender_id: UserId, participants: Vec<UserId>) -> Self {
        Self::with_recipient(
            id,
            sender_id,
            Recipient::Direct {
                display_recipient: participants,
            },
        )
    }

    fn with_recipient(id: MessageId, sender_id: UserId, recipient: Recipient) -> Self {
        Self {
            id,
            sender_id,
            recipient,
            content: String::new(),
            starred: false,
            mentioned: false,
            alerted: false,
            unread: false,
            clean_reactions: Vec::new(),
        }
    }

    /// Replace the rendered HTML body.
    pub fn with_content(mut self, html: impl Into<String>) -> Self {
        self.content = html.into();
        self
    }

    /// Whether this was sent to a channel rather than as a DM.
    pub fn is_channel_message(&self) -> bool {
        matches!(self.recipient, Recipient::Channel { .. })
    }

    /// Channel id, for channel messages.
    pub fn stream_id(&self) -> Option<ChannelId> {
        match &self.recipient {
            Recipient::Channel { stream_id, .. } => Some(*stream_id),
            Recipient::Direct { .. } => None,
        }
    }

    /// Topic name, for channel messages.
    pub fn topic(&self) -> Option<&str> {
        match &self.recipient {
            Recipient::Channel { topic, .. } => Some(topic),
            Recipient::Direct { .. } => None,
        }
    }
}
