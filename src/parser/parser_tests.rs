//! Tests for query parsing and serialization.

use super::*;
use crate::model::{Person, UserId};
use crate::snapshot::InMemoryWorkspace;

fn people() -> InMemoryWorkspace {
    InMemoryWorkspace::new().with_current_user(Person::new(
        UserId::new(1),
        "me@example.com",
        "Me Myself",
    ))
}

fn parse_query(input: &str) -> Vec<Term> {
    parse(input, false, &people())
}

fn parse_pill_query(input: &str) -> Vec<Term> {
    parse(input, true, &people())
}

fn assert_round_trip(input: &str) {
    let terms = parse_query(input);
    let reparsed = parse_query(&unparse(&terms));
    assert_eq!(
        reparsed, terms,
        "round trip through {:?} changed the terms",
        unparse(&terms)
    );
}

// ===== parse =====

#[test]
fn parse_channel_topic_and_search() {
    assert_eq!(
        parse_query("channel:100 topic:bar yo"),
        vec![
            Term::new(Operator::Channel, "100"),
            Term::new(Operator::Topic, "bar"),
            Term::new(Operator::Search, "yo"),
        ]
    );
}

#[test]
fn parse_canonicalizes_legacy_operators() {
    assert_eq!(
        parse_query("stream:100 topic:Bar yo"),
        vec![
            Term::new(Operator::Channel, "100"),
            Term::new(Operator::Topic, "Bar"),
            Term::new(Operator::Search, "yo"),
        ]
    );
    assert_eq!(
        parse_query("pm-with:me is:private"),
        vec![
            Term::new(Operator::Dm, "me@example.com"),
            Term::new(Operator::Is, "dm"),
        ]
    );
}

#[test]
fn parse_empty_input_yields_no_terms() {
    assert!(parse_query("").is_empty());
    assert!(parse_query("   ").is_empty());
}

#[test]
fn parse_negated_operator() {
    assert_eq!(
        parse_query("-topic:foo -is:starred"),
        vec![
            Term::negated(Operator::Topic, "foo"),
            Term::negated(Operator::Is, "starred"),
        ]
    );
}

#[test]
fn parse_quoted_operand_keeps_spaces() {
    assert_eq!(
        parse_query(r#"channel:"Bay Area" topic:"lunch plans""#),
        vec![
            Term::new(Operator::Channel, "Bay Area"),
            Term::new(Operator::Topic, "lunch plans"),
        ]
    );
}

#[test]
fn parse_unterminated_quote_takes_rest_of_input() {
    assert_eq!(
        parse_query(r#"topic:"lunch plans"#),
        vec![Term::new(Operator::Topic, "lunch plans")]
    );
}

#[test]
fn parse_plus_in_operand_is_a_space() {
    assert_eq!(
        parse_query("topic:lunch+plans"),
        vec![Term::new(Operator::Topic, "lunch plans")]
    );
}

#[test]
fn parse_percent_escapes_are_decoded() {
    assert_eq!(
        parse_query("topic:C%2B%2B"),
        vec![Term::new(Operator::Topic, "C++")]
    );
    assert_eq!(
        parse_query("topic:100%25"),
        vec![Term::new(Operator::Topic, "100%")]
    );
}

#[test]
fn parse_malformed_percent_escape_is_preserved() {
    assert_eq!(
        parse_query("topic:50%zz"),
        vec![Term::new(Operator::Topic, "50%zz")]
    );
}

#[test]
fn parse_empty_operand_then_separate_search() {
    assert_eq!(
        parse_query("channel: foo"),
        vec![
            Term::new(Operator::Channel, ""),
            Term::new(Operator::Search, "foo"),
        ]
    );
}

#[test]
fn parse_email_address_is_search_text() {
    assert_eq!(
        parse_query("othello@example.com"),
        vec![Term::new(Operator::Search, "othello@example.com")]
    );
}

#[test]
fn parse_url_and_emoji_colons_are_search_text() {
    assert_eq!(
        parse_query("https://example.com/x :smile: hi"),
        vec![Term::new(
            Operator::Search,
            "https://example.com/x :smile: hi"
        )]
    );
}

#[test]
fn parse_unknown_operator_is_search_text() {
    assert_eq!(
        parse_query("foo:bar baz"),
        vec![Term::new(Operator::Search, "foo:bar baz")]
    );
}

#[test]
fn parse_smart_quotes_become_ascii() {
    assert_eq!(
        parse_query("\u{201C}stop the press\u{201D}"),
        vec![Term::new(Operator::Search, "\"stop the press\"")]
    );
}

#[test]
fn parse_search_runs_are_not_merged_across_operators() {
    assert_eq!(
        parse_query("hello channel:general world again"),
        vec![
            Term::new(Operator::Search, "hello"),
            Term::new(Operator::Channel, "general"),
            Term::new(Operator::Search, "world again"),
        ]
    );
}

#[test]
fn parse_explicit_search_operator_joins_run() {
    assert_eq!(
        parse_query("hello search:world"),
        vec![Term::new(Operator::Search, "hello world")]
    );
}

#[test]
fn parse_explicit_search_with_operator_text_is_quoted() {
    assert_eq!(
        parse_query("search:topic:foo"),
        vec![Term::new(Operator::Search, "\"topic:foo\"")]
    );
}

#[test]
fn parse_explicit_search_operand_is_decoded() {
    assert_eq!(
        parse_query("search:a%20b"),
        vec![Term::new(Operator::Search, "a b")]
    );
    assert_eq!(
        parse_query("hi search:100%25"),
        vec![Term::new(Operator::Search, "hi 100%")]
    );
    assert_eq!(
        parse_query("search:a%20topic:foo"),
        vec![Term::new(Operator::Search, "\"a topic:foo\"")]
    );
    assert_eq!(parse_query("search:%20"), vec![]);
}

#[test]
fn parse_negated_search_is_its_own_term() {
    assert_eq!(
        parse_query("-search:spam"),
        vec![Term::negated(Operator::Search, "spam")]
    );
}

#[test]
fn parse_user_operands_keep_plus() {
    assert_eq!(
        parse_query("sender:bob+tag@example.com"),
        vec![Term::new(Operator::Sender, "bob+tag@example.com")]
    );
}

#[test]
fn parse_has_plural_singularizes() {
    assert_eq!(
        parse_query("has:Images"),
        vec![Term::new(Operator::Has, "image")]
    );
}

// ===== pills =====

#[test]
fn pill_keeps_spaces_in_operand() {
    assert_eq!(
        parse_pill_query("topic:lunch plans"),
        vec![Term::new(Operator::Topic, "lunch plans")]
    );
}

#[test]
fn pill_negated_operator() {
    assert_eq!(
        parse_pill_query(" -channel:Bay Area "),
        vec![Term::negated(Operator::Channel, "Bay Area")]
    );
}

#[test]
fn pill_without_operator_is_search() {
    assert_eq!(
        parse_pill_query("lunch plans"),
        vec![Term::new(Operator::Search, "lunch plans")]
    );
    assert!(parse_pill_query("  ").is_empty());
}

#[test]
fn pill_resolves_me() {
    assert_eq!(
        parse_pill_query("dm:me"),
        vec![Term::new(Operator::Dm, "me@example.com")]
    );
}

// ===== unparse =====

#[test]
fn unparse_joins_terms_in_order() {
    let terms = vec![
        Term::new(Operator::Channel, "Bay Area"),
        Term::negated(Operator::Topic, "C++"),
        Term::new(Operator::Search, "hello world"),
    ];
    assert_eq!(
        unparse(&terms),
        "channel:Bay+Area -topic:C%2B%2B hello world"
    );
}

#[test]
fn unparse_empty_operator_term_is_its_operand() {
    let terms = vec![Term::new(Operator::Other(String::new()), "")];
    assert_eq!(unparse(&terms), "");
}

#[test]
fn unparse_canonicalizes_legacy_operator_names() {
    let terms = vec![Term::new(Operator::Other("stream".into()), "Denmark")];
    assert_eq!(unparse(&terms), "channel:Denmark");
}

#[test]
fn unparse_negated_search_keeps_operator() {
    let terms = vec![Term::negated(Operator::Search, "spam eggs")];
    assert_eq!(unparse(&terms), "-search:spam%20eggs");
}

#[test]
fn unparse_quotes_are_percent_encoded() {
    let terms = vec![Term::new(Operator::Topic, r#"say "hi""#)];
    assert_eq!(unparse(&terms), "topic:say+%22hi%22");
}

// ===== operand codec =====

#[test]
fn encode_operand_plain_operators() {
    assert_eq!(encode_operand("a b+c", &Operator::Topic), "a+b%2Bc");
    assert_eq!(encode_operand("50%", &Operator::Channel), "50%25");
    assert_eq!(encode_operand("tab\there", &Operator::Topic), "tab%09here");
}

#[test]
fn encode_operand_user_operators_keep_plus() {
    assert_eq!(
        encode_operand("bob+tag@example.com", &Operator::Dm),
        "bob+tag@example.com"
    );
    assert_eq!(encode_operand("a b", &Operator::Sender), "a%20b");
}

#[test]
fn encode_operand_non_ascii_whitespace_is_utf8_bytes() {
    assert_eq!(
        encode_operand("a\u{00A0}b", &Operator::Topic),
        "a%C2%A0b"
    );
}

#[test]
fn decode_operand_trims_and_strips_quotes() {
    assert_eq!(decode_operand(" \"foo+bar\" ", &Operator::Topic), "foo bar");
    assert_eq!(
        decode_operand("bob+tag@example.com", &Operator::DmIncluding),
        "bob+tag@example.com"
    );
}

#[test]
fn percent_decode_handles_multibyte_and_garbage() {
    assert_eq!(percent_decode("caf%C3%A9"), "café");
    assert_eq!(percent_decode("%"), "%");
    assert_eq!(percent_decode("%4"), "%4");
    assert_eq!(percent_decode("%+1"), "%+1");
    assert_eq!(percent_decode("%FF"), "\u{FFFD}");
}

// ===== round trips =====

#[test]
fn round_trip_common_queries() {
    for query in [
        "channel:100 topic:bar yo",
        r#"channel:"Bay Area" -topic:"C++ tips" has:link"#,
        "hello channel:general world again",
        "channel: foo",
        "dm:alice@example.com,bob+tag@example.com with:12",
        "-search:spam is:starred",
        "search:topic:foo",
        "search:a%20topic:foo more",
        "search:100%25 search:%22x%22",
        "\u{201C}quoted phrase\u{201D} in:home",
        "topic:100%25 near:5",
        "https://example.com/x :smile:",
    ] {
        assert_round_trip(query);
    }
}
