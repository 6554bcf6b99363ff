//! Reconciling `with:` permalinks with messages that have since moved.
//!
//! A permalink such as `channel:5 topic:lunch with:42` anchors the view to
//! message 42. If that message was moved, the channel/topic (or direct
//! message) terms are rewritten to its actual location so the view still
//! shows it.

use super::predicate::{self, dm_message_key, dm_operand_key};
use super::Filter;
use crate::model::{
    ChannelId, Message, MessageId, NarrowContext, Operator, Recipient, Term, UserId,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Progress of the `with:` target adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovedTargetState {
    /// No `with` term; nothing to adjust.
    NotApplicable,
    /// The target message has not been located yet.
    NeedsAdjustment,
    /// Resolved against the local message store.
    ResolvedLocal,
    /// Resolved against a message the caller fetched from the server.
    ResolvedViaFetch,
}

impl MovedTargetState {
    /// Starting state for `terms`: pending only when a positive `with`
    /// term names a well-formed message id.
    pub fn initial(terms: &[Term]) -> Self {
        let anchored = terms
            .iter()
            .find(|t| !t.negated && t.operator == Operator::With)
            .is_some_and(|t| MessageId::parse(&t.operand).is_ok());
        if anchored {
            Self::NeedsAdjustment
        } else {
            Self::NotApplicable
        }
    }

    /// Whether the `with` target still has to be located.
    pub fn is_pending(self) -> bool {
        self == Self::NeedsAdjustment
    }
}

impl Filter {
    /// Current progress of the `with:` adjustment.
    pub fn moved_target_state(&self) -> MovedTargetState {
        self.moved_target
    }

    /// Whether the `with` target has yet to be located.
    pub fn requires_adjustment_for_moved_with_target(&self) -> bool {
        self.moved_target.is_pending()
    }

    /// Whether adjustment rewrote the terms, so the URL must change too.
    pub fn narrow_requires_hash_change(&self) -> bool {
        self.narrow_requires_hash_change
    }

    /// Locate the `with` target and rewrite the terms if it moved.
    ///
    /// `fetched` is a message the caller loaded from the server after a
    /// previous call could not find the target locally. With neither a
    /// fetched message nor a cached one this is a no-op and the Filter
    /// stays [`MovedTargetState::NeedsAdjustment`].
    pub fn try_adjusting_for_moved_with_target(&mut self, fetched: Option<&Message>) {
        if !self.moved_target.is_pending() {
            return;
        }

        let (message, resolved_state) = match fetched {
            Some(message) => (message.clone(), MovedTargetState::ResolvedViaFetch),
            None => {
                let Some(message_id) = self.with_target_id() else {
                    warn!(terms = ?self.terms, "Unparseable with operand");
                    self.moved_target = MovedTargetState::NotApplicable;
                    return;
                };
                match self.ctx.messages.get(message_id) {
                    Some(message) => (message, MovedTargetState::ResolvedLocal),
                    None => {
                        debug!(message_id = %message_id, "With target not cached locally");
                        return;
                    }
                }
            }
        };

        if let Some(adjusted) = Filter::adjusted_terms_if_moved(&self.terms, &message, &self.ctx) {
            info!(
                message_id = %message.id,
                from = ?self.terms,
                to = ?adjusted,
                "Adjusted narrow for moved with target"
            );
            self.terms = adjusted;
            self.narrow_requires_hash_change = true;
            self.reset_caches();
        }
        self.moved_target = resolved_state;
    }

    fn with_target_id(&self) -> Option<MessageId> {
        let operand = self.operands(&Operator::With).into_iter().next()?;
        MessageId::parse(&operand).ok()
    }

    /// Terms rewritten to `message`'s actual location, or `None` when
    /// `raw_terms` already point there.
    pub fn adjusted_terms_if_moved(
        raw_terms: &[Term],
        message: &Message,
        ctx: &NarrowContext,
    ) -> Option<Vec<Term>> {
        let has_with = raw_terms.iter().any(|t| t.operator == Operator::With);
        let has_location = raw_terms.iter().any(|t| {
            !t.negated && matches!(t.operator, Operator::Channel | Operator::Topic)
        });
        let dm_index = raw_terms
            .iter()
            .position(|t| !t.negated && t.operator == Operator::Dm);

        match &message.recipient {
            Recipient::Direct { display_recipient } => {
                if !has_with || display_recipient.is_empty() {
                    return None;
                }
                if has_location {
                    let operand = participant_emails(display_recipient, ctx)?;
                    return Some(vec![
                        Term::new(Operator::Dm, operand),
                        Term::new(Operator::With, message.id.to_string()),
                    ]);
                }
                let index = dm_index?;
                let current = dm_operand_key(&raw_terms[index].operand, ctx);
                if current.is_some() && current == dm_message_key(message, ctx) {
                    return None;
                }
                let operand = participant_emails(display_recipient, ctx)?;
                let mut adjusted = raw_terms.to_vec();
                adjusted[index].operand = operand;
                Some(adjusted)
            }
            Recipient::Channel { stream_id, topic } => {
                if has_with && dm_index.is_some() {
                    return Some(vec![
                        Term::new(Operator::Channel, stream_id.to_string()),
                        Term::new(Operator::Topic, topic.clone()),
                        Term::new(Operator::With, message.id.to_string()),
                    ]);
                }
                adjust_channel_topic(raw_terms, *stream_id, topic, ctx)
            }
        }
    }

    /// Whether a message moved to `new_channel` / `new_topic` could start
    /// matching this narrow.
    ///
    /// `new_channel` is a channel id string or name. Only terms that depend
    /// on a message's location are considered; a narrow with none of them
    /// cannot be newly matched by a move.
    pub fn can_newly_match_moved_messages(&self, new_channel: &str, new_topic: &str) -> bool {
        let dm_only = self.has_operand(&Operator::Is, "dm")
            || self.positive_terms(Operator::Dm).next().is_some();
        if dm_only {
            return false;
        }

        let location_terms: Vec<&Term> = self
            .terms
            .iter()
            .filter(|t| is_location_dependent(t))
            .collect();
        if location_terms.is_empty() {
            return false;
        }

        let Some(sub) = self.ctx.channels.resolve(new_channel) else {
            debug!(new_channel, "Move destination channel is unknown");
            return location_terms.iter().all(|term| match term.operator {
                Operator::Channel => {
                    term.operand.eq_ignore_ascii_case(new_channel) != term.negated
                }
                Operator::Topic => {
                    (term.operand.to_lowercase() == new_topic.to_lowercase()) != term.negated
                }
                _ => true,
            });
        };

        let relocated = Message::channel(MessageId::new(0), UserId::new(0), sub.stream_id, new_topic);
        location_terms
            .iter()
            .all(|term| predicate::term_matches(term, &relocated, &self.ctx))
    }
}

/// Terms whose outcome depends only on where a message lives.
fn is_location_dependent(term: &Term) -> bool {
    match term.operator {
        Operator::Channel | Operator::Topic | Operator::Channels => true,
        Operator::Is => matches!(term.operand.as_str(), "resolved" | "followed" | "muted"),
        Operator::In => term.operand == "home",
        _ => false,
    }
}

/// Rewrite positive channel/topic terms to the given location.
fn adjust_channel_topic(
    raw_terms: &[Term],
    stream_id: ChannelId,
    topic: &str,
    ctx: &NarrowContext,
) -> Option<Vec<Term>> {
    let mut changed = false;
    let adjusted = raw_terms
        .iter()
        .map(|term| {
            let mut term = term.clone();
            if term.negated {
                return term;
            }
            match term.operator {
                Operator::Channel if !names_channel(&term.operand, stream_id, ctx) => {
                    term.operand = stream_id.to_string();
                    changed = true;
                }
                Operator::Topic if term.operand.to_lowercase() != topic.to_lowercase() => {
                    term.operand = topic.to_string();
                    changed = true;
                }
                _ => {}
            }
            term
        })
        .collect();
    changed.then_some(adjusted)
}

fn names_channel(operand: &str, stream_id: ChannelId, ctx: &NarrowContext) -> bool {
    match ctx.channels.resolve(operand) {
        Some(sub) => sub.stream_id == stream_id,
        None => ChannelId::parse(operand).is_ok_and(|id| id == stream_id),
    }
}

/// `dm` operand for a conversation with these participants.
fn participant_emails(participants: &[UserId], ctx: &NarrowContext) -> Option<String> {
    let me = ctx.people.current_user_id();
    let mut ids: Vec<UserId> = participants
        .iter()
        .copied()
        .filter(|id| Some(*id) != me)
        .collect();
    if ids.is_empty() {
        ids = participants.to_vec();
    }
    ids.sort();
    ids.dedup();

    let emails = ids
        .into_iter()
        .map(|id| ctx.people.get_by_id(id).map(|p| p.email.to_lowercase()))
        .collect::<Option<Vec<_>>>();
    if emails.is_none() {
        warn!(?participants, "Direct message participant not in people directory");
    }
    Some(emails?.join(","))
}

#[cfg(test)]
#[path = "moved_tests.rs"]
mod tests;
