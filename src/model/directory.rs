//! Read-only collaborators consulted by the Filter.
//!
//! The Filter never mutates any of these. They are bundled into a
//! [`NarrowContext`] that each Filter clones at construction time; a compiled
//! predicate captures the same handles, so swapping out a collaborator means
//! building a new Filter.

use crate::model::{ChannelId, Message, MessageId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

// ===== Value types =====

/// A channel as seen by the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Channel id.
    pub stream_id: ChannelId,
    /// Display name; unique case-insensitively.
    pub name: String,
    /// Private channel.
    #[serde(default)]
    pub invite_only: bool,
    /// Readable by logged-out spectators.
    #[serde(default)]
    pub is_web_public: bool,
    /// Archived channels take no new messages.
    #[serde(default)]
    pub is_archived: bool,
    /// Muted by the current user.
    #[serde(default)]
    pub is_muted: bool,
    /// The current user is subscribed.
    #[serde(default = "default_true")]
    pub subscribed: bool,
}

impl Subscription {
    /// A public, subscribed, unmuted channel.
    pub fn new(stream_id: ChannelId, name: impl Into<String>) -> Self {
        Self {
            stream_id,
            name: name.into(),
            invite_only: false,
            is_web_public: false,
            is_archived: false,
            is_muted: false,
            subscribed: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Account id.
    pub user_id: UserId,
    /// Delivery email; the identity in user operands.
    pub email: String,
    /// Name shown in narrow descriptions.
    pub full_name: String,
    /// Guest account.
    #[serde(default)]
    pub is_guest: bool,
    /// Bot account.
    #[serde(default)]
    pub is_bot: bool,
}

impl Person {
    /// A regular (non-guest, non-bot) account.
    pub fn new(user_id: UserId, email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            full_name: full_name.into(),
            is_guest: false,
            is_bot: false,
        }
    }
}

/// Per-topic visibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisibilityPolicy {
    /// Follow the channel's mute setting.
    #[default]
    Inherit,
    /// Hidden from combined views.
    Muted,
    /// Shown even in a muted channel.
    Unmuted,
    /// Unmuted, with extra notifications.
    Followed,
}

/// Realm-wide switches that change matching semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RealmSettings {
    /// Legacy Zephyr mirror realms use looser channel/topic matching.
    pub zephyr_mirror_realm: bool,
}

// ===== Collaborator traits =====

/// Subscription lookup.
pub trait ChannelDirectory {
    /// Lookup by id.
    fn get_by_id(&self, stream_id: ChannelId) -> Option<Subscription>;

    /// Case-insensitive lookup by channel name.
    fn get_by_name(&self, name: &str) -> Option<Subscription>;

    /// Resolve a channel operand: a numeric id string first, then a name.
    fn resolve(&self, operand: &str) -> Option<Subscription> {
        if let Ok(stream_id) = ChannelId::parse(operand) {
            if let Some(sub) = self.get_by_id(stream_id) {
                return Some(sub);
            }
        }
        self.get_by_name(operand)
    }
}

/// User directory.
pub trait PeopleDirectory {
    /// Case-insensitive lookup by email.
    fn get_by_email(&self, email: &str) -> Option<Person>;

    /// Lookup by id.
    fn get_by_id(&self, user_id: UserId) -> Option<Person>;

    /// The logged-in user, if any (spectators have none).
    fn current_user(&self) -> Option<Person>;

    /// Id of the logged-in user.
    fn current_user_id(&self) -> Option<UserId> {
        self.current_user().map(|person| person.user_id)
    }

    /// Email of the logged-in user.
    fn current_user_email(&self) -> Option<String> {
        self.current_user().map(|person| person.email)
    }
}

/// Muted users and topic visibility policies.
pub trait MuteState {
    /// Whether the current user muted `user_id`.
    fn is_user_muted(&self, user_id: UserId) -> bool;

    /// Explicit policy for a topic; `Inherit` when none is set.
    fn topic_visibility_policy(&self, stream_id: ChannelId, topic: &str) -> VisibilityPolicy;

    /// Topic explicitly muted.
    fn is_topic_muted(&self, stream_id: ChannelId, topic: &str) -> bool {
        self.topic_visibility_policy(stream_id, topic) == VisibilityPolicy::Muted
    }

    /// Topic followed.
    fn is_topic_followed(&self, stream_id: ChannelId, topic: &str) -> bool {
        self.topic_visibility_policy(stream_id, topic) == VisibilityPolicy::Followed
    }

    /// Topic overrides a muted channel.
    fn is_topic_unmuted_or_followed(&self, stream_id: ChannelId, topic: &str) -> bool {
        matches!(
            self.topic_visibility_policy(stream_id, topic),
            VisibilityPolicy::Unmuted | VisibilityPolicy::Followed
        )
    }
}

/// Locally cached messages.
pub trait MessageStore {
    /// A cached message by id.
    fn get(&self, message_id: MessageId) -> Option<Message>;
}

// ===== NarrowContext =====

/// Dependency bundle injected into every Filter.
#[derive(Clone)]
pub struct NarrowContext {
    /// Subscriptions.
    pub channels: Rc<dyn ChannelDirectory>,
    /// Users and the logged-in identity.
    pub people: Rc<dyn PeopleDirectory>,
    /// Muted users and topic policies.
    pub mutes: Rc<dyn MuteState>,
    /// Local message cache, consulted for `with:` targets.
    pub messages: Rc<dyn MessageStore>,
    /// Realm-wide matching switches.
    pub realm: RealmSettings,
}

impl NarrowContext {
    /// Build a context whose collaborators are all served by one value.
    pub fn from_shared<T>(shared: Rc<T>, realm: RealmSettings) -> Self
    where
        T: ChannelDirectory + PeopleDirectory + MuteState + MessageStore + 'static,
    {
        Self {
            channels: shared.clone(),
            people: shared.clone(),
            mutes: shared.clone(),
            messages: shared,
            realm,
        }
    }
}

impl fmt::Debug for NarrowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrowContext")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}
