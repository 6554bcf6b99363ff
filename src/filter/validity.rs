//! Operand validation and spectator compatibility.

use super::Filter;
use crate::model::error::InvalidOperand;
use crate::model::{MessageId, NarrowContext, Operator, Term};
use crate::parser::canonicalize_operator;
use tracing::error;

const VALID_HAS_OPERANDS: &[&str] = &[
    "image",
    "images",
    "link",
    "links",
    "attachment",
    "attachments",
    "reaction",
    "reactions",
];

const VALID_IS_OPERANDS: &[&str] = &[
    "dm",
    "private",
    "starred",
    "mentioned",
    "alerted",
    "unread",
    "resolved",
    "followed",
    "muted",
];

/// Whether `term`'s operand means something for its operator.
///
/// Channel and user operands must resolve in `ctx`. Unknown operators are
/// never valid.
pub fn is_valid_search_term(term: &Term, ctx: &NarrowContext) -> bool {
    let operand = term.operand.as_str();
    match canonicalize_operator(term.operator.as_str()) {
        Operator::Has => VALID_HAS_OPERANDS.contains(&operand),
        Operator::Is => VALID_IS_OPERANDS.contains(&operand),
        Operator::In => matches!(operand, "home" | "all"),
        Operator::Id | Operator::Near | Operator::With => MessageId::parse(operand).is_ok(),
        Operator::Channel => ctx.channels.resolve(operand).is_some(),
        Operator::Channels => matches!(operand, "public" | "web-public"),
        Operator::Topic | Operator::Search => true,
        Operator::Sender | Operator::Dm | Operator::DmIncluding => {
            operand == "me"
                || operand
                    .split(',')
                    .all(|email| ctx.people.get_by_email(email.trim()).is_some())
        }
        Operator::Other(name) => {
            error!(operator = %name, "Unexpected search term operator");
            false
        }
    }
}

/// [`is_valid_search_term`] as a `Result` carrying the user-facing report.
///
/// # Errors
///
/// Returns [`InvalidOperand`] naming the operator and operand.
pub fn validate_term(term: &Term, ctx: &NarrowContext) -> Result<(), InvalidOperand> {
    if is_valid_search_term(term, ctx) {
        Ok(())
    } else {
        Err(InvalidOperand {
            operator: term.operator.to_string(),
            operand: term.operand.clone(),
        })
    }
}

/// Operators usable by logged-out visitors of web-public channels.
const SPECTATOR_OPERATORS: &[Operator] = &[
    Operator::Channel,
    Operator::Channels,
    Operator::Topic,
    Operator::Sender,
    Operator::Has,
    Operator::Search,
    Operator::Near,
    Operator::Id,
    Operator::With,
];

impl Filter {
    /// Whether every term is supported for spectators.
    pub fn is_spectator_compatible(terms: &[Term]) -> bool {
        terms
            .iter()
            .all(|term| SPECTATOR_OPERATORS.contains(&canonicalize_operator(term.operator.as_str())))
    }

    /// Every term whose operand is invalid, as user-facing reports.
    pub fn invalid_operands(&self) -> Vec<InvalidOperand> {
        self.terms
            .iter()
            .filter_map(|term| validate_term(term, &self.ctx).err())
            .collect()
    }
}
