//! Human-readable narrow descriptions (HTML fragments).

use super::Filter;
use crate::model::{NarrowContext, Operator, Term};
use crate::parser::canonicalize_operator;

const VALID_HAS_OPERANDS: &[(&str, &str)] = &[
    ("image", "images"),
    ("images", "images"),
    ("link", "links"),
    ("links", "links"),
    ("attachment", "attachments"),
    ("attachments", "attachments"),
    ("reaction", "reactions"),
    ("reactions", "reactions"),
];

/// Phrase that introduces a term's operand, e.g. `sent by`.
///
/// Empty for operators with no description.
pub fn operator_to_prefix(operator: &Operator, negated: bool) -> String {
    let operator = canonicalize_operator(operator.as_str());
    if operator == Operator::Search {
        return if negated { "exclude" } else { "search for" }.to_string();
    }

    let phrase = match operator {
        Operator::Channel => "messages in #",
        Operator::Channels => "channels",
        Operator::Near => "messages around",
        Operator::Has => "messages with",
        Operator::Id => "message ID",
        Operator::Topic => "topic",
        Operator::Sender => "sent by",
        Operator::Dm => "direct messages with",
        Operator::DmIncluding => "direct messages including",
        Operator::In => "messages in",
        Operator::Is => "messages that are",
        _ => return String::new(),
    };
    let verb = if negated { "exclude " } else { "" };
    format!("{verb}{phrase}")
}

/// Description of an `is:` term.
pub fn describe_is_operator(term: &Term) -> String {
    let verb = if term.negated { "exclude " } else { "" };
    match term.operand.as_str() {
        "starred" | "alerted" | "unread" => format!("{verb}{} messages", term.operand),
        "mentioned" => format!("{verb}@-mentions"),
        "dm" | "private" => format!("{verb}direct messages"),
        "resolved" => format!("{verb}topics marked as resolved"),
        "followed" => format!("{verb}followed topics"),
        "muted" => format!("{verb}muted messages"),
        other => format!("invalid {} operand for is operator", escape_html(other)),
    }
}

impl Filter {
    /// Comma-separated HTML description of `terms`.
    ///
    /// Operands are escaped; channel ids render as channel names.
    /// `is_spectator` changes how public-channel narrows are worded.
    pub fn search_description_as_html(
        terms: &[Term],
        is_spectator: bool,
        ctx: &NarrowContext,
    ) -> String {
        if terms.is_empty() {
            return "combined feed".to_string();
        }

        let mut parts = Vec::with_capacity(terms.len());
        let mut rest = terms;
        if let [channel, topic, tail @ ..] = terms {
            let leading_conversation = !channel.negated
                && !topic.negated
                && canonicalize_operator(channel.operator.as_str()) == Operator::Channel
                && canonicalize_operator(topic.operator.as_str()) == Operator::Topic;
            if leading_conversation {
                parts.push(format!(
                    "messages in #<strong>{}</strong> &gt; <strong>{}</strong>",
                    escape_html(&channel_name(&channel.operand, ctx)),
                    escape_html(&topic.operand)
                ));
                rest = tail;
            }
        }

        parts.extend(
            rest.iter()
                .filter(|term| canonicalize_operator(term.operator.as_str()) != Operator::With)
                .map(|term| describe_term(term, is_spectator, ctx)),
        );
        parts.join(", ")
    }

    /// Description of this Filter's own terms.
    pub fn describe(&self, is_spectator: bool) -> String {
        Filter::search_description_as_html(&self.terms, is_spectator, &self.ctx)
    }
}

fn describe_term(term: &Term, is_spectator: bool, ctx: &NarrowContext) -> String {
    let operator = canonicalize_operator(term.operator.as_str());
    let operand = term.operand.as_str();
    let verb = if term.negated { "exclude " } else { "" };

    match operator {
        Operator::Is => return describe_is_operator(term),
        Operator::Channels if matches!(operand, "public" | "web-public") => {
            let scope = if is_spectator || operand == "web-public" {
                "web-public"
            } else {
                "public"
            };
            return format!("{verb}all {scope} channels");
        }
        Operator::Has => {
            return match VALID_HAS_OPERANDS.iter().find(|(name, _)| *name == operand) {
                Some((_, plural)) => {
                    format!("{} <strong>{plural}</strong>", operator_to_prefix(&operator, term.negated))
                }
                None => format!("invalid {} operand for has operator", escape_html(operand)),
            };
        }
        _ => {}
    }

    let prefix = operator_to_prefix(&operator, term.negated);
    if prefix.is_empty() {
        return "unknown operator".to_string();
    }
    let shown = match operator {
        Operator::Channel => channel_name(operand, ctx),
        Operator::Sender | Operator::Dm | Operator::DmIncluding => person_names(operand, ctx),
        _ => operand.to_string(),
    };
    let separator = if operator == Operator::Channel { "" } else { " " };
    format!("{prefix}{separator}<strong>{}</strong>", escape_html(&shown))
}

/// Channel name for an id or name operand; unknown operands as given.
fn channel_name(operand: &str, ctx: &NarrowContext) -> String {
    ctx.channels
        .resolve(operand)
        .map(|sub| sub.name)
        .unwrap_or_else(|| operand.to_string())
}

/// Full names for a comma-separated email list; `me` for the current user.
fn person_names(operand: &str, ctx: &NarrowContext) -> String {
    let me = ctx.people.current_user_id();
    operand
        .split(',')
        .map(|email| match ctx.people.get_by_email(email.trim()) {
            Some(person) if Some(person.user_id) == me => "me".to_string(),
            Some(person) => person.full_name,
            None => email.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
