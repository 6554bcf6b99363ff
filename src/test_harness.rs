//! Shared fixtures for unit tests.
//!
//! One small realm with a handful of users, channels with different
//! privacy and mute settings, and a few cached messages.

use crate::model::{
    ChannelId, Message, MessageId, NarrowContext, Person, RealmSettings, Subscription, Term,
    UserId, VisibilityPolicy,
};
use crate::snapshot::InMemoryWorkspace;

pub const ME: UserId = UserId::new(1);
pub const ALICE: UserId = UserId::new(2);
pub const BOB: UserId = UserId::new(3);
pub const CAROL: UserId = UserId::new(4);

pub const DENMARK: ChannelId = ChannelId::new(5);
pub const SWEDEN: ChannelId = ChannelId::new(6);
pub const NORWAY: ChannelId = ChannelId::new(7);
pub const VERONA: ChannelId = ChannelId::new(8);

/// Cached channel message in Sweden / "new home".
pub const MOVED_CHANNEL_MESSAGE: MessageId = MessageId::new(100);
/// Cached direct message between me and Alice.
pub const CACHED_DM: MessageId = MessageId::new(101);

pub fn workspace() -> InMemoryWorkspace {
    let mut denmark = Subscription::new(DENMARK, "Denmark");
    denmark.is_web_public = true;
    let mut sweden = Subscription::new(SWEDEN, "Sweden");
    sweden.invite_only = true;
    let mut norway = Subscription::new(NORWAY, "Norway");
    norway.is_muted = true;

    InMemoryWorkspace::new()
        .with_current_user(Person::new(ME, "me@example.com", "Me Myself"))
        .with_user(Person::new(ALICE, "alice@example.com", "Alice"))
        .with_user(Person::new(BOB, "bob@example.com", "Bob"))
        .with_user(Person::new(CAROL, "carol@example.com", "Carol"))
        .with_channel(denmark)
        .with_channel(sweden)
        .with_channel(norway)
        .with_channel(Subscription::new(VERONA, "Verona"))
        .with_muted_user(CAROL)
        .with_topic_policy(DENMARK, "muted topic", VisibilityPolicy::Muted)
        .with_topic_policy(DENMARK, "followed topic", VisibilityPolicy::Followed)
        .with_topic_policy(NORWAY, "unmuted topic", VisibilityPolicy::Unmuted)
        .with_message(channel_message(MOVED_CHANNEL_MESSAGE.get(), SWEDEN, "new home"))
        .with_message(dm_message(CACHED_DM.get(), &[ME, ALICE]))
}

pub fn ctx() -> NarrowContext {
    workspace().into_context(RealmSettings::default())
}

pub fn zephyr_ctx() -> NarrowContext {
    workspace().into_context(RealmSettings {
        zephyr_mirror_realm: true,
    })
}

pub fn channel_message(id: u64, stream_id: ChannelId, topic: &str) -> Message {
    Message::channel(MessageId::new(id), ALICE, stream_id, topic)
}

/// Direct message from the first participant.
pub fn dm_message(id: u64, participants: &[UserId]) -> Message {
    let sender = participants.first().copied().unwrap_or(ME);
    Message::direct(MessageId::new(id), sender, participants.to_vec())
}

pub fn term(operator: &str, operand: &str) -> Term {
    Term::new(operator, operand)
}

pub fn not(operator: &str, operand: &str) -> Term {
    Term::negated(operator, operand)
}
