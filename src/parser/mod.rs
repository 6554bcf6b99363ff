//! Query string parser and serializer.
//!
//! Converts between the text a user types in the search box (or that a
//! permalink decodes to) and an ordered list of canonical [`Term`]s.
//! `parse(unparse(terms)) == terms` holds for every term list `parse`
//! produces.

pub mod canonical;

use crate::model::{Operator, PeopleDirectory, Term};
use regex::Regex;
use std::sync::LazyLock;

pub use canonical::{canonicalize_operator, canonicalize_term};

/// Tokens: an optional `operator:` prefix followed by a quoted phrase
/// (closing quote optional) or a run of non-whitespace.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^\s:]+:)?("[^"]+"?|\S+)"#).expect("token regex"));

/// Parse a query string into canonical terms.
///
/// Contiguous runs of plain words become one `search` term each; a run is
/// closed whenever an operator term is emitted, so search terms keep their
/// position relative to operator terms. Tokens whose operator is not in the
/// vocabulary (`https://...`, `:smile:`) are plain words.
///
/// With `for_pills`, the whole input is one completed search pill.
pub fn parse(input: &str, for_pills: bool, people: &dyn PeopleDirectory) -> Vec<Term> {
    if for_pills {
        return parse_pill(input, people);
    }

    let mut terms = Vec::new();
    let mut search_words: Vec<String> = Vec::new();

    for token in TOKEN.find_iter(input).map(|m| m.as_str()) {
        let Some((negated, operator, raw_operand)) = split_operator_token(token) else {
            search_words.push(token.to_string());
            continue;
        };
        if operator == Operator::Search && !negated {
            if let Some(word) = explicit_search_word(raw_operand) {
                search_words.push(word);
            }
            continue;
        }

        let operand = decode_operand(raw_operand, &operator);
        flush_search_words(&mut search_words, &mut terms, people);
        terms.push(canonicalize_term(
            Term {
                operator,
                operand,
                negated,
            },
            people,
        ));
    }

    flush_search_words(&mut search_words, &mut terms, people);
    terms
}

/// Parse a single completed pill such as `topic:with space`.
fn parse_pill(input: &str, people: &dyn PeopleDirectory) -> Vec<Term> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let term = match split_operator_token(trimmed) {
        Some((negated, operator, raw_operand)) => {
            let operand = decode_operand(raw_operand, &operator);
            Term {
                operator,
                operand,
                negated,
            }
        }
        None => Term::new(Operator::Search, trimmed),
    };
    vec![canonicalize_term(term, people)]
}

/// Split `-?operator:operand`, returning `None` for plain words.
///
/// The operator is canonicalized; unknown operators count as plain words.
fn split_operator_token(token: &str) -> Option<(bool, Operator, &str)> {
    if token.starts_with('"') {
        return None;
    }
    let (raw_operator, raw_operand) = token.split_once(':')?;
    let (negated, name) = match raw_operator.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw_operator),
    };
    if name.chars().any(char::is_whitespace) {
        return None;
    }
    let operator = canonicalize_operator(name);
    operator.is_known().then_some((negated, operator, raw_operand))
}

/// Decoded operand of an explicit `search:` token, as it joins the run.
///
/// Text that would read back as an operator term is quoted so it stays a
/// search phrase.
fn explicit_search_word(raw_operand: &str) -> Option<String> {
    let decoded = decode_operand(raw_operand, &Operator::Search).replace('"', "");
    let words: Vec<&str> = decoded.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let phrase = words.join(" ");
    if words.iter().any(|word| split_operator_token(word).is_some()) {
        return Some(format!("\"{phrase}\""));
    }
    Some(phrase)
}

fn flush_search_words(
    words: &mut Vec<String>,
    terms: &mut Vec<Term>,
    people: &dyn PeopleDirectory,
) {
    if words.is_empty() {
        return;
    }
    let operand = words.join(" ");
    words.clear();
    terms.push(canonicalize_term(Term::new(Operator::Search, operand), people));
}

/// Serialize terms back into a query string.
pub fn unparse(terms: &[Term]) -> String {
    terms
        .iter()
        .map(|term| {
            let operator = canonicalize_operator(term.operator.as_str());
            match operator {
                Operator::Search if !term.negated => term.operand.clone(),
                Operator::Other(ref name) if name.is_empty() => term.operand.clone(),
                _ => {
                    let sign = if term.negated { "-" } else { "" };
                    format!(
                        "{sign}{operator}:{}",
                        encode_operand(&term.operand, &operator)
                    )
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ===== Operand codec =====

/// Operators whose operands keep `+` literal.
fn keeps_literal_plus(operator: &Operator) -> bool {
    operator.is_user_operator() || *operator == Operator::Search
}

/// Encode an operand for the search box.
///
/// Spaces become `+` for most operators; emails and free-text search keep
/// `+` literal, so they percent-encode whitespace instead.
pub fn encode_operand(operand: &str, operator: &Operator) -> String {
    let literal_plus = keeps_literal_plus(operator);
    let mut out = String::with_capacity(operand.len());
    for c in operand.chars() {
        match c {
            ' ' if !literal_plus => out.push('+'),
            '+' if !literal_plus => push_percent_encoded(&mut out, c),
            '"' | '%' => push_percent_encoded(&mut out, c),
            c if c.is_whitespace() => push_percent_encoded(&mut out, c),
            c => out.push(c),
        }
    }
    out
}

/// Decode an operand typed after `operator:`.
pub fn decode_operand(encoded: &str, operator: &Operator) -> String {
    let mut text = encoded.trim().replace('"', "");
    if !keeps_literal_plus(operator) {
        text = text.replace('+', " ");
    }
    percent_decode(&text).trim().to_string()
}

fn push_percent_encoded(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    for byte in c.encode_utf8(&mut buf).bytes() {
        out.push_str(&format!("%{byte:02X}"));
    }
}

/// Percent-decode, preserving malformed escapes verbatim.
///
/// Decoded bytes are interpreted as UTF-8 (lossy), so a stray `%FF`
/// cannot fail the whole operand.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|digit| digit as u8)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
