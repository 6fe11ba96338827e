//! Property-based tests using proptest
//!
//! These tests check parser and source location behavior across a wide
//! range of generated inputs.

use parsling::grammar::*;
use parsling::engine::{column_of, line_of};
use parsling::{Parser, ParserOptions, Value};
use proptest::prelude::*;

fn word_parser() -> Parser {
    let grammar = GrammarSpec::new("words")
        .ignore("whitespace")
        .rule("whitespace", re(r"\s+"))
        .rule("words", zero_or_more_of(re("[a-z]+")).named("words"));
    Parser::new(&grammar).unwrap()
}

fn assignment_parser() -> Parser {
    let grammar = GrammarSpec::new("program")
        .ignore("whitespace")
        .rule("whitespace", re(r"\s+"))
        .rule("program", zero_or_more_of("assignment").named("statements"))
        .rule(
            "assignment",
            seq([
                re("[a-z]+").named("target"),
                re("="),
                one_of([re(r"\d+"), re("[a-z]+")]).named("value"),
                re(";"),
            ]),
        );
    Parser::new(&grammar).unwrap()
}

/// The assignment grammar with the span of its statements captured
fn spanned_assignment_parser() -> Parser {
    let grammar = GrammarSpec::new("program")
        .ignore("whitespace")
        .rule("whitespace", re(r"\s+"))
        .rule(
            "program",
            seq([zero_or_more_of("assignment")
                .named("statements")
                .capture_bounds_as("span")]),
        )
        .rule(
            "assignment",
            seq([
                re("[a-z]+").named("target"),
                re("="),
                one_of([re(r"\d+"), re("[a-z]+")]).named("value"),
                re(";"),
            ]),
        );
    Parser::new(&grammar).unwrap()
}

fn span_offsets(value: &Value) -> Option<(usize, usize)> {
    let span = value.get("span")?;
    let start = span.get("start")?.get("offset")?.as_int()?;
    let end = span.get("end")?.get("offset")?.as_int()?;
    Some((start as usize, end as usize))
}

fn without(mut value: Value, key: &str) -> Value {
    if let Some(map) = value.as_hash_mut() {
        map.remove(key);
    }
    value
}

fn words_of(value: &Value) -> Vec<String> {
    value
        .get("words")
        .and_then(|w| w.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Repetition Tests
// =============================================================================

proptest! {
    /// Whitespace-separated words come back in order
    #[test]
    fn test_words_match_split_whitespace(input in "[a-z ]{0,40}") {
        let parser = word_parser();
        let value = parser.parse(&input).unwrap();

        let expected: Vec<String> = input.split_whitespace().map(str::to_string).collect();
        prop_assert_eq!(words_of(&value), expected);
    }

    /// Numbers separated by spaces survive a parse unchanged
    #[test]
    fn test_number_list(numbers in prop::collection::vec(0u32..100_000, 1..20)) {
        let grammar = GrammarSpec::new("list")
            .ignore("whitespace")
            .rule("whitespace", re(r"\s+"))
            .rule("list", one_or_more_of(re(r"\d+")).named("items"));
        let parser = Parser::new(&grammar).unwrap();

        let input = numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let value = parser.parse(&input).unwrap();
        let parsed: Vec<u32> = value
            .get("items")
            .and_then(|items| items.as_array())
            .unwrap()
            .iter()
            .filter_map(|item| item.as_str().and_then(|s| s.parse().ok()))
            .collect();
        prop_assert_eq!(parsed, numbers);
    }
}

// =============================================================================
// Determinism Tests
// =============================================================================

proptest! {
    /// A parser reused across inputs behaves like a fresh one
    #[test]
    fn test_reused_parser_matches_fresh(first in "[a-z0-9=; ]{0,30}", second in "[a-z0-9=; ]{0,30}") {
        let reused = assignment_parser();
        let _ = reused.parse(&first);
        let again = reused.parse(&second);
        let fresh = assignment_parser().parse(&second);

        prop_assert_eq!(again, fresh);
    }

    /// Failures never point outside the input
    #[test]
    fn test_error_range_within_input(input in "\\PC{0,30}") {
        let parser = assignment_parser();

        if let Err(error) = parser.parse(&input) {
            if let (Some(start), Some(end)) = (error.start_offset(), error.end_offset()) {
                prop_assert!(start <= end);
                prop_assert!(end <= input.len());
            }
            prop_assert_eq!(error.text(), input.as_str());
        }
    }
}

proptest! {
    /// Re-parsing the matched span reproduces the same tree
    #[test]
    fn test_reparse_of_matched_span(
        statements in prop::collection::vec(
            ("[a-z]{1,5}", "[0-9]{1,3}|[a-z]{1,3}", " {0,2}"),
            0..6,
        ),
        lead in " {0,3}",
        trail in " {0,3}",
    ) {
        let body: String = statements
            .iter()
            .map(|(target, value, gap)| format!("{target}{gap}={gap}{value};{gap}"))
            .collect();
        let input = format!("{lead}{body}{trail}");
        let parser = spanned_assignment_parser();

        let first = parser.parse(&input).unwrap();
        let (start, end) = span_offsets(&first).unwrap();
        let second = parser.parse(&input[start..end]).unwrap();

        prop_assert_eq!(without(second, "span"), without(first, "span"));
    }
}

// =============================================================================
// Bounds Tests
// =============================================================================

proptest! {
    /// Bounds start after skipped whitespace and end after the word
    #[test]
    fn test_bounds_after_leading_whitespace(indent in 0usize..6, word in "[a-z]{1,8}") {
        let grammar = GrammarSpec::new("token")
            .ignore("whitespace")
            .rule("whitespace", re(" +"))
            .rule("token", seq([re("[a-z]+").named("text").capture_bounds_as("at")]));
        let parser = Parser::with_options(&grammar, ParserOptions::new()).unwrap();
        let input = format!("{}{}", " ".repeat(indent), word);

        let value = parser.parse(&input).unwrap();
        let at = value.get("at").unwrap();
        let start = at.get("start").unwrap();
        let end = at.get("end").unwrap();
        prop_assert_eq!(start.get("offset"), Some(&Value::int(indent as i64)));
        prop_assert_eq!(start.get("column"), Some(&Value::int(indent as i64 + 1)));
        prop_assert_eq!(end.get("offset"), Some(&Value::int(input.len() as i64)));
        prop_assert_eq!(end.get("line"), Some(&Value::int(1)));
    }
}

// =============================================================================
// Source Location Tests
// =============================================================================

proptest! {
    /// Line numbers count the newlines before the offset
    #[test]
    fn test_line_counts_newlines(text in "[a-z\n]{0,40}", pick in 0usize..100) {
        let offset = pick % (text.len() + 1);
        let expected = text[..offset].matches('\n').count() + 1;

        prop_assert_eq!(line_of(&text, offset), expected);
    }

    /// Columns restart after every newline
    #[test]
    fn test_column_restarts_after_newline(text in "[a-z\n]{0,40}", pick in 0usize..100) {
        let offset = pick % (text.len() + 1);
        let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);

        prop_assert_eq!(column_of(&text, offset), offset - line_start + 1);
    }

    /// Columns count characters, not bytes
    #[test]
    fn test_column_counts_chars(prefix in "[äöü]{0,10}") {
        let expected = prefix.chars().count() + 1;

        prop_assert_eq!(column_of(&prefix, prefix.len()), expected);
    }
}
