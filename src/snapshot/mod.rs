//! Workspace snapshots: an in-memory stand-in for the live client state.
//!
//! A snapshot is a JSON document listing users, channels, mute settings and
//! cached messages. [`InMemoryWorkspace`] serves every collaborator trait
//! from it, which is what the CLI, the tests and the benchmarks run against.

use crate::model::error::SnapshotError;
use crate::model::{
    ChannelDirectory, ChannelId, Message, MessageId, MessageStore, MuteState, NarrowContext,
    PeopleDirectory, Person, RealmSettings, Subscription, UserId, VisibilityPolicy,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

// ===== Snapshot file format =====

/// On-disk snapshot schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSnapshot {
    /// Logged-in user; absent for spectators.
    #[serde(default)]
    pub current_user_id: Option<UserId>,
    /// Every known account, the current user included.
    #[serde(default)]
    pub users: Vec<Person>,
    /// Channels visible to the current user.
    #[serde(default)]
    pub channels: Vec<Subscription>,
    /// Users the current user muted.
    #[serde(default)]
    pub muted_user_ids: Vec<UserId>,
    /// Non-default topic visibility policies.
    #[serde(default)]
    pub topic_policies: Vec<TopicPolicy>,
    /// Locally cached messages.
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// A non-default visibility policy for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPolicy {
    /// Channel of the topic.
    pub stream_id: ChannelId,
    /// Topic name; matched case-insensitively.
    pub topic: String,
    /// The policy in force.
    pub policy: VisibilityPolicy,
}

/// Load a snapshot from a JSON file.
///
/// # Errors
///
/// Returns [`SnapshotError::Read`] if the file cannot be read and
/// [`SnapshotError::Parse`] if it does not match the schema.
pub fn load_snapshot(path: &Path) -> Result<WorkspaceSnapshot, SnapshotError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: WorkspaceSnapshot =
        serde_json::from_str(&contents).map_err(|e| SnapshotError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!(
        path = %path.display(),
        users = snapshot.users.len(),
        channels = snapshot.channels.len(),
        messages = snapshot.messages.len(),
        "Loaded workspace snapshot"
    );
    Ok(snapshot)
}

// ===== InMemoryWorkspace =====

/// In-memory implementation of every collaborator trait.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkspace {
    current_user: Option<UserId>,
    users: BTreeMap<UserId, Person>,
    channels: BTreeMap<ChannelId, Subscription>,
    muted_users: HashSet<UserId>,
    /// Keyed by channel and lower-cased topic name.
    topic_policies: HashMap<(ChannelId, String), VisibilityPolicy>,
    messages: BTreeMap<MessageId, Message>,
}

impl InMemoryWorkspace {
    /// An empty workspace with no logged-in user.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a loaded snapshot.
    pub fn from_snapshot(snapshot: WorkspaceSnapshot) -> Self {
        let mut workspace = Self::new();
        workspace.current_user = snapshot.current_user_id;
        for person in snapshot.users {
            workspace = workspace.with_user(person);
        }
        for sub in snapshot.channels {
            workspace = workspace.with_channel(sub);
        }
        for user_id in snapshot.muted_user_ids {
            workspace = workspace.with_muted_user(user_id);
        }
        for entry in snapshot.topic_policies {
            workspace = workspace.with_topic_policy(entry.stream_id, &entry.topic, entry.policy);
        }
        for message in snapshot.messages {
            workspace = workspace.with_message(message);
        }
        workspace
    }

    /// Add `person` and log in as them.
    pub fn with_current_user(mut self, person: Person) -> Self {
        self.current_user = Some(person.user_id);
        self.with_user(person)
    }

    /// Add an account.
    pub fn with_user(mut self, person: Person) -> Self {
        self.users.insert(person.user_id, person);
        self
    }

    /// Add a channel.
    pub fn with_channel(mut self, sub: Subscription) -> Self {
        self.channels.insert(sub.stream_id, sub);
        self
    }

    /// Mute `user_id`.
    pub fn with_muted_user(mut self, user_id: UserId) -> Self {
        self.muted_users.insert(user_id);
        self
    }

    /// Set a topic's visibility policy.
    pub fn with_topic_policy(
        mut self,
        stream_id: ChannelId,
        topic: &str,
        policy: VisibilityPolicy,
    ) -> Self {
        self.topic_policies
            .insert((stream_id, topic.to_lowercase()), policy);
        self
    }

    /// Cache a message.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.insert(message.id, message);
        self
    }

    /// Cached messages in id order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Wrap into a [`NarrowContext`].
    pub fn into_context(self, realm: RealmSettings) -> NarrowContext {
        NarrowContext::from_shared(Rc::new(self), realm)
    }
}

impl ChannelDirectory for InMemoryWorkspace {
    fn get_by_id(&self, stream_id: ChannelId) -> Option<Subscription> {
        self.channels.get(&stream_id).cloned()
    }

    fn get_by_name(&self, name: &str) -> Option<Subscription> {
        let wanted = name.to_lowercase();
        self.channels
            .values()
            .find(|sub| sub.name.to_lowercase() == wanted)
            .cloned()
    }
}

impl PeopleDirectory for InMemoryWorkspace {
    fn get_by_email(&self, email: &str) -> Option<Person> {
        let wanted = email.trim().to_lowercase();
        self.users
            .values()
            .find(|person| person.email.to_lowercase() == wanted)
            .cloned()
    }

    fn get_by_id(&self, user_id: UserId) -> Option<Person> {
        self.users.get(&user_id).cloned()
    }

    fn current_user(&self) -> Option<Person> {
        self.current_user
            .and_then(|user_id| self.users.get(&user_id).cloned())
    }
}

impl MuteState for InMemoryWorkspace {
    fn is_user_muted(&self, user_id: UserId) -> bool {
        self.muted_users.contains(&user_id)
    }

    fn topic_visibility_policy(&self, stream_id: ChannelId, topic: &str) -> VisibilityPolicy {
        self.topic_policies
            .get(&(stream_id, topic.to_lowercase()))
            .copied()
            .unwrap_or_default()
    }
}

impl MessageStore for InMemoryWorkspace {
    fn get(&self, message_id: MessageId) -> Option<Message> {
        self.messages.get(&message_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn workspace() -> InMemoryWorkspace {
        InMemoryWorkspace::new()
            .with_current_user(Person::new(UserId::new(1), "Me@Example.com", "Me"))
            .with_user(Person::new(UserId::new(2), "alice@example.com", "Alice"))
            .with_channel(Subscription::new(ChannelId::new(5), "Denmark"))
            .with_topic_policy(ChannelId::new(5), "Pizza", VisibilityPolicy::Followed)
    }

    #[test]
    fn people_lookup_is_case_insensitive() {
        let ws = workspace();
        assert_eq!(
            ws.get_by_email("me@EXAMPLE.com").map(|p| p.user_id),
            Some(UserId::new(1))
        );
        assert_eq!(ws.current_user_email().as_deref(), Some("Me@Example.com"));
    }

    #[test]
    fn channel_lookup_by_name_is_case_insensitive() {
        let ws = workspace();
        assert_eq!(
            ws.get_by_name("denmark").map(|s| s.stream_id),
            Some(ChannelId::new(5))
        );
    }

    #[test]
    fn topic_policy_lookup_ignores_case() {
        let ws = workspace();
        assert!(ws.is_topic_followed(ChannelId::new(5), "pizza"));
        assert!(!ws.is_topic_muted(ChannelId::new(5), "pizza"));
        assert_eq!(
            ws.topic_visibility_policy(ChannelId::new(5), "other"),
            VisibilityPolicy::Inherit
        );
    }

    #[test]
    fn spectator_workspace_has_no_current_user() {
        let ws = InMemoryWorkspace::new();
        assert_eq!(ws.current_user(), None);
        assert_eq!(ws.current_user_id(), None);
    }

    #[test]
    fn load_snapshot_reads_json_file() {
        let path = std::env::temp_dir().join("narrow_filter_snapshot_ok.json");
        let json = r#"{
            "current_user_id": 1,
            "users": [{"user_id": 1, "email": "me@example.com", "full_name": "Me"}],
            "channels": [{"stream_id": 5, "name": "Denmark", "is_muted": true}],
            "topic_policies": [{"stream_id": 5, "topic": "bar", "policy": "UNMUTED"}],
            "messages": [
                {"id": 10, "sender_id": 1, "type": "stream", "stream_id": 5, "topic": "bar"}
            ]
        }"#;
        fs::write(&path, json).expect("write snapshot");

        let snapshot = load_snapshot(&path).expect("snapshot loads");
        let ws = InMemoryWorkspace::from_snapshot(snapshot);
        assert_eq!(ws.current_user_id(), Some(UserId::new(1)));
        assert!(ChannelDirectory::get_by_id(&ws, ChannelId::new(5)).is_some_and(|s| s.is_muted));
        assert!(ws.is_topic_unmuted_or_followed(ChannelId::new(5), "Bar"));
        assert!(MessageStore::get(&ws, MessageId::new(10)).is_some());

        fs::remove_file(path).ok();
    }

    #[test]
    fn load_snapshot_reports_missing_file() {
        let result = load_snapshot(Path::new("/nonexistent/narrow_filter/snapshot.json"));
        assert!(matches!(result, Err(SnapshotError::Read { .. })));
    }

    #[test]
    fn load_snapshot_rejects_unknown_fields() {
        let path = std::env::temp_dir().join("narrow_filter_snapshot_bad.json");
        fs::write(&path, r#"{"unexpected": true}"#).expect("write snapshot");

        let result = load_snapshot(&path);
        match result {
            Err(SnapshotError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("Expected Parse error, got {:?}", other),
        }

        fs::remove_file(path).ok();
    }
}
