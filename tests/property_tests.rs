//! Property-based tests for parser and filter invariants.
//!
//! Tests validate:
//! 1. parse(unparse(terms)) == terms for parsed queries
//! 2. canonicalize_term is idempotent
//! 3. Filter::equals ignores term order

use narrow_filter::model::{NarrowContext, Person, RealmSettings, Term, UserId};
use narrow_filter::parser::{canonicalize_term, parse, unparse};
use narrow_filter::snapshot::InMemoryWorkspace;
use narrow_filter::Filter;
use proptest::prelude::*;

fn ctx() -> NarrowContext {
    InMemoryWorkspace::new()
        .with_current_user(Person::new(UserId::new(1), "me@example.com", "Me"))
        .with_user(Person::new(UserId::new(2), "alice@example.com", "Alice"))
        .into_context(RealmSettings::default())
}

// ===== Generators =====

fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}"
}

/// One whitespace-free query token.
fn token() -> impl Strategy<Value = String> {
    prop_oneof![
        word().prop_map(|w| format!("channel:{w}")),
        word().prop_map(|w| format!("topic:{w}")),
        (word(), word()).prop_map(|(a, b)| format!("topic:\"{a} {b}\"")),
        prop::sample::select(vec!["starred", "dm", "mentioned", "unread", "resolved"])
            .prop_map(|w| format!("is:{w}")),
        prop::sample::select(vec!["link", "image", "attachment", "reaction"])
            .prop_map(|w| format!("-has:{w}")),
        prop::sample::select(vec!["me", "alice@example.com"]).prop_map(|w| format!("sender:{w}")),
        (1u32..10_000).prop_map(|n| format!("near:{n}")),
        word(),
    ]
}

fn query() -> impl Strategy<Value = String> {
    prop::collection::vec(token(), 0..6).prop_map(|tokens| tokens.join(" "))
}

fn raw_term() -> impl Strategy<Value = Term> {
    let operator = prop::sample::select(vec![
        "stream", "channel", "subject", "topic", "from", "sender", "pm-with", "dm",
        "group-pm-with", "has", "is", "streams", "search", "near", "Bogus-Op",
    ]);
    let operand = prop_oneof![
        Just("me".to_string()),
        Just("ME".to_string()),
        Just("Links".to_string()),
        Just("private".to_string()),
        "[A-Za-z0-9@. ]{0,12}",
    ];
    (operator, operand, any::<bool>()).prop_map(|(op, operand, negated)| {
        if negated {
            Term::negated(op, operand)
        } else {
            Term::new(op, operand)
        }
    })
}

// ===== Property 1: Round trip =====

proptest! {
    #[test]
    fn parse_unparse_round_trips(q in query()) {
        let ctx = ctx();
        let terms = parse(&q, false, ctx.people.as_ref());
        let reparsed = parse(&unparse(&terms), false, ctx.people.as_ref());
        prop_assert_eq!(reparsed, terms, "query: {}", q);
    }
}

// ===== Property 2: Canonicalization idempotence =====

proptest! {
    #[test]
    fn canonicalize_term_is_idempotent(term in raw_term()) {
        let ctx = ctx();
        let once = canonicalize_term(term, ctx.people.as_ref());
        let twice = canonicalize_term(once.clone(), ctx.people.as_ref());
        prop_assert_eq!(twice, once);
    }
}

// ===== Property 3: Order-independent equality =====

proptest! {
    #[test]
    fn equals_ignores_term_order(terms in prop::collection::vec(raw_term(), 0..6)) {
        let mut reversed = terms.clone();
        reversed.reverse();

        let a = Filter::new(terms, ctx());
        let b = Filter::new(reversed, ctx());
        prop_assert!(a.equals(&b, &[]));
        prop_assert!(b.equals(&a, &[]));
    }
}
