//! The narrow Filter engine.
//!
//! A [`Filter`] wraps an ordered term list and answers every question the
//! UI asks about a narrow: which specialized view can render it, whether
//! its messages can be marked read, whether it can be evaluated locally,
//! and, through [`Filter::predicate`], whether a given message matches.
//!
//! Derived state (sorted term types, the read-marking decision, the
//! compiled predicate) is computed lazily and cached on the instance. The
//! only mutations, [`Filter::update_email`] and
//! [`Filter::try_adjusting_for_moved_with_target`], reset every cache.

pub mod content;
pub mod describe;
pub mod moved;
pub mod predicate;
pub mod term_type;
pub mod validity;

pub use moved::MovedTargetState;
pub use predicate::Predicate;
pub use term_type::{sorted_term_types, term_type};
pub use validity::{is_valid_search_term, validate_term};

use crate::model::{
    Message, NarrowContext, Operator, PeopleDirectory, Subscription, Term, UserId,
};
use crate::parser::{self, canonicalize_operator};
use std::cell::OnceCell;
use std::fmt;
use tracing::debug;

/// Tags whose presence never splits a conversation across the view.
const CONVERSATION_LEVEL_TERM_TYPES: &[&str] = &[
    "channel",
    "topic",
    "dm",
    "dm-including",
    "not-dm-including",
    "with",
    "is-dm",
    "not-is-dm",
    "is-resolved",
    "not-is-resolved",
    "is-followed",
    "not-is-followed",
    "is-muted",
    "not-is-muted",
    "in-home",
    "not-in-home",
    "in-all",
    "channels-public",
    "not-channels-public",
    "channels-web-public",
    "not-channels-web-public",
];

/// Term shapes whose messages can all be marked read on view.
const READ_TRACKABLE_SHAPES: &[&[&str]] = &[
    &["channel", "topic", "with"],
    &["channel", "topic"],
    &["dm", "with"],
    &["dm"],
    &["channel"],
    &["is-dm"],
    &["is-resolved"],
    &["in-home"],
    &["in-all"],
    &[],
];

/// Extra shapes with a dedicated navigation entry.
const COMMON_ONLY_SHAPES: &[&[&str]] = &[
    &["is-mentioned"],
    &["is-starred"],
    &["is-alerted"],
    &["is-followed"],
    &["is-unread"],
    &["channels-public"],
    &["sender"],
];

// ===== Filter =====

/// A narrow: an ordered term list plus lazily derived state.
#[derive(Clone)]
pub struct Filter {
    terms: Vec<Term>,
    ctx: NarrowContext,
    moved_target: MovedTargetState,
    narrow_requires_hash_change: bool,
    sorted_term_types: OnceCell<Vec<String>>,
    can_mark_messages_read: OnceCell<bool>,
    predicate: OnceCell<Predicate>,
}

impl Filter {
    /// Wrap `terms` as given; no canonicalization happens here.
    pub fn new(terms: Vec<Term>, ctx: NarrowContext) -> Self {
        let moved_target = MovedTargetState::initial(&terms);
        Self {
            terms,
            ctx,
            moved_target,
            narrow_requires_hash_change: false,
            sorted_term_types: OnceCell::new(),
            can_mark_messages_read: OnceCell::new(),
            predicate: OnceCell::new(),
        }
    }

    /// Parse `query` and wrap the resulting terms.
    pub fn from_query(query: &str, ctx: NarrowContext) -> Self {
        let terms = parser::parse(query, false, ctx.people.as_ref());
        Self::new(terms, ctx)
    }

    /// Canonical terms, in query order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Workspace state this Filter reads.
    pub fn context(&self) -> &NarrowContext {
        &self.ctx
    }

    /// Serialize back into a query string.
    pub fn unparse(&self) -> String {
        parser::unparse(&self.terms)
    }

    fn reset_caches(&mut self) {
        self.sorted_term_types = OnceCell::new();
        self.can_mark_messages_read = OnceCell::new();
        self.predicate = OnceCell::new();
    }

    fn positive_terms(&self, operator: Operator) -> impl Iterator<Item = &Term> {
        self.terms
            .iter()
            .filter(move |t| !t.negated && t.operator == operator)
    }

    // ===== Membership =====

    /// Operands of non-negated terms with `operator`, in term order.
    pub fn operands(&self, operator: &Operator) -> Vec<String> {
        self.positive_terms(operator.clone())
            .map(|t| t.operand.clone())
            .collect()
    }

    /// Whether any term, negated or not, uses `operator`.
    pub fn has_operator(&self, operator: &Operator) -> bool {
        self.terms.iter().any(|t| t.operator == *operator)
    }

    /// Whether a non-negated `operator` term has exactly `operand`.
    pub fn has_operand(&self, operator: &Operator, operand: &str) -> bool {
        self.positive_terms(operator.clone()).any(|t| t.operand == operand)
    }

    /// Whether a negated `operator` term has exactly `operand`.
    pub fn has_negated_operand(&self, operator: &Operator, operand: &str) -> bool {
        self.terms
            .iter()
            .any(|t| t.negated && t.operator == *operator && t.operand == operand)
    }

    /// Like [`Filter::has_operand`], ignoring case.
    pub fn has_operand_case_insensitive(&self, operator: &Operator, operand: &str) -> bool {
        let wanted = operand.to_lowercase();
        self.positive_terms(operator.clone())
            .any(|t| t.operand.to_lowercase() == wanted)
    }

    /// Narrowed to exactly this channel operand and topic (among others).
    pub fn has_topic(&self, channel: &str, topic: &str) -> bool {
        self.has_operand(&Operator::Channel, channel) && self.has_operand(&Operator::Topic, topic)
    }

    /// Any `search` term, negated or not.
    pub fn is_keyword_search(&self) -> bool {
        self.has_operator(&Operator::Search)
    }

    // ===== Term types =====

    /// Tags of this Filter's terms, by priority.
    pub fn sorted_term_types(&self) -> &[String] {
        self.sorted_term_types.get_or_init(|| {
            let tags: Vec<String> = self.terms.iter().map(term_type).collect();
            sorted_term_types(&tags)
        })
    }

    /// The exact tag shape, only when no term is negated.
    fn positive_shape(&self) -> Option<&[String]> {
        if self.terms.iter().any(|t| t.negated) {
            return None;
        }
        Some(self.sorted_term_types())
    }

    fn shape_is_one_of(&self, shapes: &[&[&str]]) -> bool {
        self.positive_shape().is_some_and(|shape| {
            shapes.iter().any(|wanted| {
                shape.len() == wanted.len() && shape.iter().zip(wanted.iter()).all(|(a, b)| a == b)
            })
        })
    }

    /// Whether the highest-priority tags are exactly `wanted`, in order.
    ///
    /// Used to pick a pre-bucketed index (e.g. all unread messages of one
    /// topic) instead of scanning every message.
    pub fn can_bucket_by(&self, wanted: &[&str]) -> bool {
        let sorted = self.sorted_term_types();
        if sorted.len() < wanted.len() {
            return false;
        }
        let prefix_matches = sorted
            .iter()
            .zip(wanted.iter())
            .all(|(tag, key)| tag == key);
        if !prefix_matches {
            return false;
        }
        !self.terms.iter().any(|t| {
            t.negated && term_type::is_positional(&t.operator) && wanted.contains(&t.operator.as_str())
        })
    }

    // ===== Classification =====

    /// Whether viewing this narrow may mark its messages read.
    pub fn can_mark_messages_read(&self) -> bool {
        *self
            .can_mark_messages_read
            .get_or_init(|| self.calc_can_mark_messages_read())
    }

    fn calc_can_mark_messages_read(&self) -> bool {
        self.shape_is_one_of(READ_TRACKABLE_SHAPES)
    }

    /// Whether the predicate can be evaluated against cached messages.
    ///
    /// `is_local_echo` marks candidate sets containing locally echoed
    /// messages, whose content lacks server-rendered links and images.
    pub fn can_apply_locally(&self, is_local_echo: bool) -> bool {
        if self.is_keyword_search() {
            return false;
        }
        if is_local_echo && self.has_operator(&Operator::Has) {
            return false;
        }
        if self.has_operator(&Operator::Channels)
            || self.has_negated_operand(&Operator::Channels, "public")
        {
            return false;
        }
        true
    }

    /// Exactly one channel and one topic term, nothing else.
    pub fn has_exactly_channel_topic_operators(&self) -> bool {
        self.terms.len() == 2
            && self.positive_terms(Operator::Channel).count() == 1
            && self.positive_terms(Operator::Topic).count() == 1
    }

    /// A single channel+topic or direct-message conversation.
    pub fn is_conversation_view(&self) -> bool {
        self.shape_is_one_of(&[
            &["channel", "topic", "with"],
            &["channel", "topic"],
            &["dm", "with"],
            &["dm"],
        ])
    }

    /// A single conversation anchored with `near`.
    pub fn is_conversation_view_with_near(&self) -> bool {
        self.shape_is_one_of(&[&["channel", "topic", "near"], &["dm", "near"]])
    }

    /// A lone positive `channel` term.
    pub fn is_channel_view(&self) -> bool {
        matches!(
            self.terms.as_slice(),
            [term] if term.operator == Operator::Channel && !term.negated
        )
    }

    /// Not pinned to one channel+topic or one direct message.
    pub fn may_contain_multiple_conversations(&self) -> bool {
        let channel_topic = self.positive_terms(Operator::Channel).next().is_some()
            && self.positive_terms(Operator::Topic).next().is_some();
        let dm = self.positive_terms(Operator::Dm).next().is_some();
        !(channel_topic || dm)
    }

    /// Whether a message in view implies its whole conversation is in view.
    pub fn contains_no_partial_conversations(&self) -> bool {
        self.sorted_term_types()
            .iter()
            .all(|tag| CONVERSATION_LEVEL_TERM_TYPES.contains(&tag.as_str()))
    }

    /// Restricted to direct messages.
    pub fn contains_only_private_messages(&self) -> bool {
        self.has_operand(&Operator::Is, "dm")
            || self.positive_terms(Operator::Dm).next().is_some()
            || self.positive_terms(Operator::DmIncluding).next().is_some()
    }

    /// Mentions or starred messages.
    pub fn is_personal_filter(&self) -> bool {
        self.has_operand(&Operator::Is, "mentioned") || self.has_operand(&Operator::Is, "starred")
    }

    /// Narrows with a dedicated entry in the navigation UI.
    pub fn is_common_narrow(&self) -> bool {
        self.can_mark_messages_read() || self.shape_is_one_of(COMMON_ONLY_SHAPES)
    }

    /// Exactly `in:home`.
    pub fn is_in_home(&self) -> bool {
        self.shape_is_one_of(&[&["in-home"]])
    }

    /// Whether messages in muted topics are hidden.
    pub fn excludes_muted_topics(&self) -> bool {
        !(self.has_operator(&Operator::Channel) && self.has_operator(&Operator::Topic))
            && !self.is_keyword_search()
            && !(self.has_operator(&Operator::Dm) || self.has_operand(&Operator::Is, "dm"))
            && !self.has_operand(&Operator::Is, "starred")
            && !self.has_operand(&Operator::Is, "muted")
            && !self.has_negated_operand(&Operator::In, "home")
    }

    /// Whether messages from muted users are hidden.
    pub fn excludes_muted_users(&self) -> bool {
        !(self.has_operator(&Operator::Dm)
            || self.has_operator(&Operator::DmIncluding)
            || self.has_operator(&Operator::Sender)
            || self.has_operand(&Operator::Is, "dm"))
    }

    /// Whether history from before the user subscribed is in view.
    pub fn includes_full_channel_history(&self) -> bool {
        self.positive_terms(Operator::Channel).next().is_some()
            || self.has_operand(&Operator::Channels, "public")
    }

    /// A one-on-one direct message conversation.
    pub fn is_non_group_direct_message(&self) -> bool {
        let dms: Vec<&Term> = self.positive_terms(Operator::Dm).collect();
        matches!(dms.as_slice(), [term] if !term.operand.contains(','))
    }

    /// Subscription named by the first positive channel term.
    pub fn channel_subscription(&self) -> Option<Subscription> {
        let operand = self.positive_terms(Operator::Channel).next()?;
        self.ctx.channels.resolve(&operand.operand)
    }

    // ===== Predicate =====

    /// The compiled matcher, built on first use.
    pub fn predicate(&self) -> Predicate {
        self.predicate
            .get_or_init(|| predicate::compile(&self.terms, &self.ctx))
            .clone()
    }

    /// Whether `message` is shown in this narrow: it matches, and its
    /// sender is not muted when the narrow hides muted users.
    pub fn is_message_visible(&self, message: &Message) -> bool {
        if !(self.predicate())(message) {
            return false;
        }
        !(self.excludes_muted_users() && self.ctx.mutes.is_user_muted(message.sender_id))
    }

    // ===== Derived Filters =====

    /// A new Filter with the first term sharing `new_term`'s operator
    /// replaced by it.
    pub fn filter_with_new_params(&self, new_term: Term) -> Filter {
        let new_term = Term {
            operator: canonicalize_operator(new_term.operator.as_str()),
            ..new_term
        };
        let mut terms = self.terms.clone();
        if let Some(slot) = terms.iter_mut().find(|t| t.operator == new_term.operator) {
            *slot = new_term;
        }
        Filter::new(terms, self.ctx.clone())
    }

    /// Order-independent equality, ignoring terms with `excluded` operators.
    pub fn equals(&self, other: &Filter, excluded: &[Operator]) -> bool {
        let comparable = |filter: &Filter| {
            let mut terms: Vec<Term> = filter
                .terms
                .iter()
                .filter(|t| !excluded.contains(&t.operator))
                .cloned()
                .collect();
            terms.sort();
            terms
        };
        comparable(self) == comparable(other)
    }

    /// Point user operands at `user_id`'s new email.
    ///
    /// An operand is rewritten only when every email in it resolves;
    /// channel operands are never touched.
    pub fn update_email(&mut self, user_id: UserId, new_email: &str) {
        let people = self.ctx.people.clone();
        let mut changed = false;
        for term in &mut self.terms {
            if !term.operator.is_user_operator() {
                continue;
            }
            if let Some(updated) =
                update_email_in_operand(&term.operand, user_id, new_email, people.as_ref())
            {
                term.operand = updated;
                changed = true;
            }
        }
        if changed {
            debug!(user_id = %user_id, "Updated email in narrow terms");
            self.reset_caches();
        }
    }
}

/// Rewrite a comma-separated email list, or `None` if nothing changes.
fn update_email_in_operand(
    operand: &str,
    user_id: UserId,
    new_email: &str,
    people: &dyn PeopleDirectory,
) -> Option<String> {
    let persons = operand
        .split(',')
        .map(|email| people.get_by_email(email.trim()))
        .collect::<Option<Vec<_>>>()?;
    if !persons.iter().any(|p| p.user_id == user_id) {
        return None;
    }
    let emails: Vec<String> = persons
        .into_iter()
        .map(|p| {
            if p.user_id == user_id {
                new_email.to_string()
            } else {
                p.email
            }
        })
        .collect();
    Some(emails.join(","))
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("terms", &self.terms)
            .field("moved_target", &self.moved_target)
            .field(
                "narrow_requires_hash_change",
                &self.narrow_requires_hash_change,
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
