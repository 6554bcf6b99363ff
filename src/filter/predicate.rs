//! Predicate compiler.
//!
//! Each restrictive term is resolved once into a [`TermMatcher`] (channel
//! names to ids, emails to user ids, Zephyr patterns to regexes). The
//! resulting closure holds the matchers plus the [`NarrowContext`] handles
//! it needs for mute and subscription lookups.

use super::content;
use crate::model::topic::is_resolved;
use crate::model::{
    ChannelId, Message, NarrowContext, Operator, Recipient, Term, UserId,
};
use regex::Regex;
use std::rc::Rc;
use std::sync::LazyLock;
use tracing::{debug, error};

/// Compiled matcher for a narrow.
pub type Predicate = Rc<dyn Fn(&Message) -> bool>;

/// Strips Zephyr `un` prefixes and `.d` suffixes from a channel name.
static ZEPHYR_CHANNEL_BASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:un)*(.+?)(?:\.d)*$").expect("zephyr channel regex"));

/// Strips Zephyr `.d` suffixes from a topic name.
static ZEPHYR_TOPIC_BASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*?)(?:\.d)*$").expect("zephyr topic regex"));

/// Topics Zephyr treats as the empty instance.
static ZEPHYR_PERSONAL_TOPIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^(|personal|\(instance ""\))(\.d)*$"#).expect("zephyr personal regex")
});

// ===== Matchers =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IsOperand {
    Dm,
    Starred,
    Mentioned,
    Alerted,
    Unread,
    Resolved,
    Followed,
    Muted,
}

impl IsOperand {
    fn parse(operand: &str) -> Option<Self> {
        match operand {
            "dm" | "private" => Some(Self::Dm),
            "starred" => Some(Self::Starred),
            "mentioned" => Some(Self::Mentioned),
            "alerted" => Some(Self::Alerted),
            "unread" => Some(Self::Unread),
            "resolved" => Some(Self::Resolved),
            "followed" => Some(Self::Followed),
            "muted" => Some(Self::Muted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HasOperand {
    Link,
    Image,
    Attachment,
    Reaction,
}

impl HasOperand {
    fn parse(operand: &str) -> Option<Self> {
        match operand {
            "link" | "links" => Some(Self::Link),
            "image" | "images" => Some(Self::Image),
            "attachment" | "attachments" => Some(Self::Attachment),
            "reaction" | "reactions" => Some(Self::Reaction),
            _ => None,
        }
    }
}

/// One pre-resolved term.
#[derive(Debug, Clone)]
enum TermMatcher {
    Everything,
    Nothing,
    ChannelId(ChannelId),
    /// Operand that names no known channel; compared against the message's
    /// channel name.
    ChannelName(String),
    ZephyrChannel(Regex),
    Topic(String),
    ZephyrTopic(Regex),
    Sender(UserId),
    /// Sorted participant ids, excluding the current user unless it is a
    /// conversation with oneself.
    Dm(Vec<UserId>),
    DmIncluding(UserId),
    Is(IsOperand),
    Has(HasOperand),
    InHome,
    Id(String),
    ChannelsPublic,
    ChannelsWebPublic,
}

/// Terms the client cannot or need not evaluate.
pub(crate) fn is_restrictive(term: &Term) -> bool {
    !matches!(
        term.operator,
        Operator::Search | Operator::Near | Operator::With | Operator::Other(_)
    )
}

/// Compile the predicate for `terms`.
pub fn compile(terms: &[Term], ctx: &NarrowContext) -> Predicate {
    let matchers: Vec<(TermMatcher, bool)> = terms
        .iter()
        .filter(|term| is_restrictive(term))
        .map(|term| (resolve_term(term, ctx), term.negated))
        .collect();

    debug!(
        terms = terms.len(),
        restrictive = matchers.len(),
        "Compiled narrow predicate"
    );

    if matchers.is_empty() {
        return Rc::new(|_: &Message| true);
    }

    let ctx = ctx.clone();
    Rc::new(move |message: &Message| {
        matchers
            .iter()
            .all(|(matcher, negated)| matches_term(matcher, message, &ctx) != *negated)
    })
}

/// Evaluate a single term against `message` without caching anything.
pub(crate) fn term_matches(term: &Term, message: &Message, ctx: &NarrowContext) -> bool {
    if !is_restrictive(term) {
        return true;
    }
    matches_term(&resolve_term(term, ctx), message, ctx) != term.negated
}

fn resolve_term(term: &Term, ctx: &NarrowContext) -> TermMatcher {
    let operand = term.operand.as_str();
    match term.operator {
        Operator::Channel => resolve_channel(operand, ctx),
        Operator::Topic => resolve_topic(operand, ctx),
        Operator::Sender => match ctx.people.get_by_email(operand) {
            Some(person) => TermMatcher::Sender(person.user_id),
            None => TermMatcher::Nothing,
        },
        Operator::Dm => match dm_operand_key(operand, ctx) {
            Some(ids) => TermMatcher::Dm(ids),
            None => TermMatcher::Nothing,
        },
        Operator::DmIncluding => match ctx.people.get_by_email(operand) {
            Some(person) => TermMatcher::DmIncluding(person.user_id),
            None => TermMatcher::Nothing,
        },
        Operator::Is => IsOperand::parse(operand).map_or(TermMatcher::Nothing, TermMatcher::Is),
        Operator::Has => HasOperand::parse(operand).map_or(TermMatcher::Nothing, TermMatcher::Has),
        Operator::In => match operand {
            "home" => TermMatcher::InHome,
            _ => TermMatcher::Everything,
        },
        Operator::Id => TermMatcher::Id(operand.to_string()),
        Operator::Channels => match operand {
            "public" => TermMatcher::ChannelsPublic,
            "web-public" => TermMatcher::ChannelsWebPublic,
            _ => TermMatcher::Nothing,
        },
        Operator::Search | Operator::Near | Operator::With | Operator::Other(_) => {
            TermMatcher::Everything
        }
    }
}

fn resolve_channel(operand: &str, ctx: &NarrowContext) -> TermMatcher {
    let sub = ctx.channels.resolve(operand);
    if !ctx.realm.zephyr_mirror_realm {
        return match sub {
            Some(sub) => TermMatcher::ChannelId(sub.stream_id),
            None => match ChannelId::parse(operand) {
                Ok(stream_id) => TermMatcher::ChannelId(stream_id),
                Err(_) => TermMatcher::ChannelName(operand.to_lowercase()),
            },
        };
    }

    let name = sub.map(|sub| sub.name).unwrap_or_else(|| operand.to_string());
    if name.is_empty() {
        return TermMatcher::Nothing;
    }
    let base = ZEPHYR_CHANNEL_BASE
        .captures(&name)
        .and_then(|caps| caps.get(1))
        .map_or(name.as_str(), |m| m.as_str());
    match Regex::new(&format!(r"(?i)^(un)*{}(\.d)*$", regex::escape(base))) {
        Ok(pattern) => TermMatcher::ZephyrChannel(pattern),
        Err(e) => {
            error!(operand, error = %e, "Failed to build Zephyr channel pattern");
            TermMatcher::Nothing
        }
    }
}

fn resolve_topic(operand: &str, ctx: &NarrowContext) -> TermMatcher {
    let lowered = operand.to_lowercase();
    if !ctx.realm.zephyr_mirror_realm {
        return TermMatcher::Topic(lowered);
    }
    if lowered.is_empty() {
        return TermMatcher::Nothing;
    }

    let base = ZEPHYR_TOPIC_BASE
        .captures(&lowered)
        .and_then(|caps| caps.get(1))
        .map_or(lowered.as_str(), |m| m.as_str());
    if base.is_empty() || base == "personal" || base == "(instance \"\")" {
        return TermMatcher::ZephyrTopic(ZEPHYR_PERSONAL_TOPIC.clone());
    }
    match Regex::new(&format!(r"(?i)^{}(\.d)*$", regex::escape(base))) {
        Ok(pattern) => TermMatcher::ZephyrTopic(pattern),
        Err(e) => {
            error!(operand, error = %e, "Failed to build Zephyr topic pattern");
            TermMatcher::Nothing
        }
    }
}

// ===== Direct message participants =====

/// Participant ids named by a `dm` operand, normalized for comparison.
///
/// `None` if any email is unknown.
pub(crate) fn dm_operand_key(operand: &str, ctx: &NarrowContext) -> Option<Vec<UserId>> {
    let mut ids = operand
        .split(',')
        .map(|email| ctx.people.get_by_email(email.trim()).map(|p| p.user_id))
        .collect::<Option<Vec<_>>>()?;
    ids.sort();
    ids.dedup();
    if let Some(me) = ctx.people.current_user_id() {
        if ids.len() > 1 {
            ids.retain(|id| *id != me);
        }
    }
    Some(ids)
}

/// Participant ids of a direct message, normalized like [`dm_operand_key`].
///
/// `None` for channel messages and for the data-integrity violation of a
/// direct message without recipients.
pub(crate) fn dm_message_key(message: &Message, ctx: &NarrowContext) -> Option<Vec<UserId>> {
    let Recipient::Direct { display_recipient } = &message.recipient else {
        return None;
    };
    if display_recipient.is_empty() {
        error!(message_id = %message.id, "Empty recipient list in direct message");
        return None;
    }

    let mut ids = display_recipient.clone();
    ids.sort();
    ids.dedup();
    if let Some(me) = ctx.people.current_user_id() {
        let others: Vec<UserId> = ids.iter().copied().filter(|id| *id != me).collect();
        if !others.is_empty() {
            return Some(others);
        }
        return Some(vec![me]);
    }
    Some(ids)
}

// ===== Evaluation =====

fn matches_term(matcher: &TermMatcher, message: &Message, ctx: &NarrowContext) -> bool {
    match matcher {
        TermMatcher::Everything => true,
        TermMatcher::Nothing => false,
        TermMatcher::ChannelId(stream_id) => message.stream_id() == Some(*stream_id),
        TermMatcher::ChannelName(name) => {
            channel_name(message, ctx).is_some_and(|actual| actual.to_lowercase() == *name)
        }
        TermMatcher::ZephyrChannel(pattern) => {
            channel_name(message, ctx).is_some_and(|actual| pattern.is_match(&actual))
        }
        TermMatcher::Topic(topic) => message
            .topic()
            .is_some_and(|actual| actual.to_lowercase() == *topic),
        TermMatcher::ZephyrTopic(pattern) => {
            message.topic().is_some_and(|actual| pattern.is_match(actual))
        }
        TermMatcher::Sender(user_id) => message.sender_id == *user_id,
        TermMatcher::Dm(ids) => {
            dm_message_key(message, ctx).is_some_and(|participants| participants == *ids)
        }
        TermMatcher::DmIncluding(user_id) => match &message.recipient {
            Recipient::Direct { display_recipient } => display_recipient.contains(user_id),
            Recipient::Channel { .. } => false,
        },
        TermMatcher::Is(operand) => matches_is(*operand, message, ctx),
        TermMatcher::Has(operand) => match operand {
            HasOperand::Link => content::message_has_link(&message.content),
            HasOperand::Image => content::message_has_image(&message.content),
            HasOperand::Attachment => content::message_has_attachment(&message.content),
            HasOperand::Reaction => content::message_has_reaction(message),
        },
        TermMatcher::InHome => message_in_home(message, ctx),
        TermMatcher::Id(id) => message.id.to_string() == *id,
        TermMatcher::ChannelsPublic => message
            .stream_id()
            .and_then(|stream_id| ctx.channels.get_by_id(stream_id))
            .is_some_and(|sub| !sub.invite_only),
        TermMatcher::ChannelsWebPublic => message
            .stream_id()
            .and_then(|stream_id| ctx.channels.get_by_id(stream_id))
            .is_some_and(|sub| sub.is_web_public),
    }
}

fn matches_is(operand: IsOperand, message: &Message, ctx: &NarrowContext) -> bool {
    match operand {
        IsOperand::Dm => !message.is_channel_message(),
        IsOperand::Starred => message.starred,
        IsOperand::Mentioned => message.mentioned,
        IsOperand::Alerted => message.alerted,
        IsOperand::Unread => message.unread,
        IsOperand::Resolved => message.topic().is_some_and(is_resolved),
        IsOperand::Followed => match &message.recipient {
            Recipient::Channel { stream_id, topic } => {
                ctx.mutes.is_topic_followed(*stream_id, topic)
            }
            Recipient::Direct { .. } => false,
        },
        IsOperand::Muted => match &message.recipient {
            Recipient::Channel { stream_id, topic } => {
                ctx.mutes.is_topic_muted(*stream_id, topic)
                    || (is_channel_muted(*stream_id, ctx)
                        && !ctx.mutes.is_topic_unmuted_or_followed(*stream_id, topic))
            }
            Recipient::Direct { .. } => false,
        },
    }
}

/// Whether a message shows up in the home view.
fn message_in_home(message: &Message, ctx: &NarrowContext) -> bool {
    if message.mentioned {
        return true;
    }
    match &message.recipient {
        Recipient::Direct { .. } => true,
        Recipient::Channel { stream_id, topic } => {
            (!is_channel_muted(*stream_id, ctx) && !ctx.mutes.is_topic_muted(*stream_id, topic))
                || ctx.mutes.is_topic_unmuted_or_followed(*stream_id, topic)
        }
    }
}

fn is_channel_muted(stream_id: ChannelId, ctx: &NarrowContext) -> bool {
    ctx.channels
        .get_by_id(stream_id)
        .is_some_and(|sub| sub.is_muted)
}

fn channel_name(message: &Message, ctx: &NarrowContext) -> Option<String> {
    message
        .stream_id()
        .and_then(|stream_id| ctx.channels.get_by_id(stream_id))
        .map(|sub| sub.name)
}

#[cfg(test)]
#[path = "predicate_tests.rs"]
mod tests;
