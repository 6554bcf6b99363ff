//! Canonicalization of legacy operator and operand spellings.
//!
//! Old permalinks keep working: `stream:` is `channel:`, `pm-with:` is
//! `dm:`, `is:private` is `is:dm`, and so on. Each term is canonicalized
//! independently of its neighbours.

use crate::model::{Operator, PeopleDirectory, Term};

/// Legacy operator aliases, matched after lower-casing.
const OPERATOR_ALIASES: &[(&str, Operator)] = &[
    ("stream", Operator::Channel),
    ("subject", Operator::Topic),
    ("from", Operator::Sender),
    ("streams", Operator::Channels),
    ("pm-with", Operator::Dm),
    ("group-pm-with", Operator::DmIncluding),
];

/// Plural `has:` operands accepted for compatibility.
const HAS_PLURALS: &[(&str, &str)] = &[
    ("attachments", "attachment"),
    ("images", "image"),
    ("links", "link"),
    ("reactions", "reaction"),
];

/// Map an operator name (any case, possibly an alias) to its canonical form.
pub fn canonicalize_operator(name: &str) -> Operator {
    let lowered = name.to_lowercase();
    OPERATOR_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, operator)| operator.clone())
        .unwrap_or_else(|| Operator::from_canonical(&lowered))
}

/// Canonicalize one term.
///
/// `"me"` in user operators resolves through `people`; when no user is
/// logged in it is left as-is.
pub fn canonicalize_term(term: Term, people: &dyn PeopleDirectory) -> Term {
    let Term {
        operator,
        operand,
        negated,
    } = term;
    let operator = canonicalize_operator(operator.as_str());

    let operand = match operator {
        Operator::Sender | Operator::Dm | Operator::DmIncluding => {
            let lowered = operand.to_lowercase();
            if lowered == "me" {
                people
                    .current_user_email()
                    .map(|email| email.to_lowercase())
                    .unwrap_or(lowered)
            } else {
                lowered
            }
        }
        Operator::Has => {
            let lowered = operand.to_lowercase();
            HAS_PLURALS
                .iter()
                .find(|(plural, _)| *plural == lowered)
                .map(|(_, singular)| (*singular).to_string())
                .unwrap_or(lowered)
        }
        Operator::Is => {
            let lowered = operand.to_lowercase();
            if lowered == "private" {
                "dm".to_string()
            } else {
                lowered
            }
        }
        Operator::Search => operand.replace(['\u{201C}', '\u{201D}'], "\""),
        Operator::Channel | Operator::Topic => operand,
        _ => operand.to_lowercase(),
    };

    Term {
        operator,
        operand,
        negated,
    }
}
