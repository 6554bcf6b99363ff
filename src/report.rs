//! Serializable summary of a narrow, printed by the CLI.

use crate::filter::{Filter, MovedTargetState};
use crate::model::{Message, MessageId, Term};
use serde::Serialize;

/// Every classification the UI branches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// See [`Filter::is_keyword_search`].
    pub is_keyword_search: bool,
    /// See [`Filter::can_mark_messages_read`].
    pub can_mark_messages_read: bool,
    /// [`Filter::can_apply_locally`] for server-rendered candidates.
    pub can_apply_locally: bool,
    /// See [`Filter::has_exactly_channel_topic_operators`].
    pub has_exactly_channel_topic_operators: bool,
    /// See [`Filter::is_conversation_view`].
    pub is_conversation_view: bool,
    /// See [`Filter::is_conversation_view_with_near`].
    pub is_conversation_view_with_near: bool,
    /// See [`Filter::is_channel_view`].
    pub is_channel_view: bool,
    /// See [`Filter::may_contain_multiple_conversations`].
    pub may_contain_multiple_conversations: bool,
    /// See [`Filter::contains_no_partial_conversations`].
    pub contains_no_partial_conversations: bool,
    /// See [`Filter::contains_only_private_messages`].
    pub contains_only_private_messages: bool,
    /// See [`Filter::is_personal_filter`].
    pub is_personal_filter: bool,
    /// See [`Filter::is_common_narrow`].
    pub is_common_narrow: bool,
    /// See [`Filter::is_in_home`].
    pub is_in_home: bool,
    /// See [`Filter::excludes_muted_topics`].
    pub excludes_muted_topics: bool,
    /// See [`Filter::excludes_muted_users`].
    pub excludes_muted_users: bool,
    /// See [`Filter::includes_full_channel_history`].
    pub includes_full_channel_history: bool,
    /// See [`Filter::is_non_group_direct_message`].
    pub is_non_group_direct_message: bool,
    /// See [`Filter::is_spectator_compatible`].
    pub is_spectator_compatible: bool,
}

impl Classification {
    /// Evaluate every classification of `filter`.
    pub fn of(filter: &Filter) -> Self {
        Self {
            is_keyword_search: filter.is_keyword_search(),
            can_mark_messages_read: filter.can_mark_messages_read(),
            can_apply_locally: filter.can_apply_locally(false),
            has_exactly_channel_topic_operators: filter.has_exactly_channel_topic_operators(),
            is_conversation_view: filter.is_conversation_view(),
            is_conversation_view_with_near: filter.is_conversation_view_with_near(),
            is_channel_view: filter.is_channel_view(),
            may_contain_multiple_conversations: filter.may_contain_multiple_conversations(),
            contains_no_partial_conversations: filter.contains_no_partial_conversations(),
            contains_only_private_messages: filter.contains_only_private_messages(),
            is_personal_filter: filter.is_personal_filter(),
            is_common_narrow: filter.is_common_narrow(),
            is_in_home: filter.is_in_home(),
            excludes_muted_topics: filter.excludes_muted_topics(),
            excludes_muted_users: filter.excludes_muted_users(),
            includes_full_channel_history: filter.includes_full_channel_history(),
            is_non_group_direct_message: filter.is_non_group_direct_message(),
            is_spectator_compatible: Filter::is_spectator_compatible(filter.terms()),
        }
    }
}

/// A parsed narrow and everything derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct NarrowReport {
    /// The query as typed.
    pub query: String,
    /// Parsed terms, after any `with:` adjustment.
    pub terms: Vec<Term>,
    /// `terms` serialized back into a query.
    pub unparsed: String,
    /// Term type tags by priority.
    pub sorted_term_types: Vec<String>,
    /// View-selection booleans.
    pub classification: Classification,
    /// One message per invalid term.
    pub invalid_operands: Vec<String>,
    /// HTML description for the search bar.
    pub description: String,
    /// Progress of the `with:` adjustment.
    pub moved_target: MovedTargetState,
    /// Whether adjustment rewrote the terms.
    pub narrow_requires_hash_change: bool,
    /// Ids of matching `messages`; absent when the narrow needs the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_message_ids: Option<Vec<MessageId>>,
}

impl NarrowReport {
    /// Summarize `filter`, listing the visible `messages` when the narrow can
    /// apply locally.
    pub fn build<'a>(
        query: &str,
        filter: &Filter,
        messages: impl IntoIterator<Item = &'a Message>,
        is_spectator: bool,
    ) -> Self {
        let matching_message_ids = filter.can_apply_locally(false).then(|| {
            messages
                .into_iter()
                .filter(|message| filter.is_message_visible(message))
                .map(|message| message.id)
                .collect()
        });

        Self {
            query: query.to_string(),
            terms: filter.terms().to_vec(),
            unparsed: filter.unparse(),
            sorted_term_types: filter.sorted_term_types().to_vec(),
            classification: Classification::of(filter),
            invalid_operands: filter
                .invalid_operands()
                .iter()
                .map(ToString::to_string)
                .collect(),
            description: filter.describe(is_spectator),
            moved_target: filter.moved_target_state(),
            narrow_requires_hash_change: filter.narrow_requires_hash_change(),
            matching_message_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::{channel_message, ctx, CAROL, DENMARK, SWEDEN};

    #[test]
    fn report_lists_local_matches() {
        let filter = Filter::from_query("channel:5 topic:lunch", ctx());
        let messages = [
            channel_message(1, DENMARK, "Lunch"),
            channel_message(2, DENMARK, "dinner"),
            channel_message(3, SWEDEN, "lunch"),
        ];
        let report = NarrowReport::build("channel:5 topic:lunch", &filter, &messages, false);

        assert_eq!(report.matching_message_ids, Some(vec![MessageId::new(1)]));
        assert!(report.classification.is_conversation_view);
        assert!(report.classification.can_mark_messages_read);
        assert_eq!(report.sorted_term_types, vec!["channel", "topic"]);
        assert!(report.invalid_operands.is_empty());
    }

    #[test]
    fn report_skips_muted_senders() {
        let filter = Filter::from_query("channel:5", ctx());
        let messages = [
            channel_message(1, DENMARK, "t"),
            Message::channel(MessageId::new(2), CAROL, DENMARK, "t"),
        ];
        let report = NarrowReport::build("channel:5", &filter, &messages, false);
        assert_eq!(report.matching_message_ids, Some(vec![MessageId::new(1)]));
    }

    #[test]
    fn report_omits_matches_for_server_side_narrows() {
        let filter = Filter::from_query("channel:5 lunch", ctx());
        let report = NarrowReport::build("channel:5 lunch", &filter, &[], false);
        assert_eq!(report.matching_message_ids, None);

        let json = serde_json::to_value(&report).expect("report serializes");
        assert!(json.get("matching_message_ids").is_none());
        assert_eq!(json["terms"][1]["operator"], "search");
        assert_eq!(json["moved_target"], "not_applicable");
    }

    #[test]
    fn report_json_shape() {
        let filter = Filter::from_query("is:dm has:rainbows", ctx());
        let report = NarrowReport::build("is:dm has:rainbows", &filter, &[], false);
        let json = serde_json::to_string_pretty(&report.invalid_operands).expect("serializes");
        insta::assert_snapshot!(json, @r#"
        [
          "invalid rainbows operand for has operator"
        ]
        "#);
        assert_eq!(report.unparsed, "is:dm has:rainbows");
    }
}
