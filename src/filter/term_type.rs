//! Coarse per-term category tags used for bucketing and stable ordering.

use crate::model::{Operator, Term};

/// Tag ranking, highest priority first.
const TERM_TYPE_PRIORITY: &[&str] = &[
    "channels-public",
    "channels-web-public",
    "channel",
    "topic",
    "dm",
    "is-dm",
    "dm-including",
    "with",
    "sender",
    "near",
    "id",
    "is-alerted",
    "is-mentioned",
    "is-starred",
    "is-unread",
    "is-resolved",
    "is-followed",
    "is-muted",
    "has-link",
    "has-image",
    "has-attachment",
    "has-reaction",
    "in-home",
    "in-all",
    "search",
];

/// Operators whose tag ignores negation.
pub(crate) fn is_positional(operator: &Operator) -> bool {
    matches!(
        operator,
        Operator::Channel
            | Operator::Topic
            | Operator::Sender
            | Operator::Near
            | Operator::Id
            | Operator::With
    )
}

/// Operators whose tag embeds the operand.
fn embeds_operand(operator: &Operator) -> bool {
    matches!(
        operator,
        Operator::Is | Operator::Has | Operator::In | Operator::Channels
    )
}

/// Category tag for one term, e.g. `channel`, `is-dm`, `not-has-link`.
pub fn term_type(term: &Term) -> String {
    if is_positional(&term.operator) {
        return term.operator.as_str().to_string();
    }

    let mut tag = String::new();
    if term.negated {
        tag.push_str("not-");
    }
    tag.push_str(term.operator.as_str());
    if embeds_operand(&term.operator) {
        tag.push('-');
        tag.push_str(&term.operand);
    }
    tag
}

fn priority(tag: &str) -> usize {
    TERM_TYPE_PRIORITY
        .iter()
        .position(|known| *known == tag)
        .unwrap_or(TERM_TYPE_PRIORITY.len())
}

/// Order tags by [`TERM_TYPE_PRIORITY`]; unranked tags keep their relative
/// order after every ranked one.
pub fn sorted_term_types(tags: &[String]) -> Vec<String> {
    let mut sorted = tags.to_vec();
    sorted.sort_by_key(|tag| priority(tag));
    sorted
}
