//! Integration tests for bounds capture
//!
//! Bounds are `{start: {offset, line, column}, end: {...}}` maps attached to
//! captures, either for a single component (`capture_bounds_as`) or for
//! every map capture when the parser is built with capture-all-bounds.

use parsling::grammar::*;
use parsling::{Parser, ParserOptions, Value};
use serde_json::json;

fn ast(expected: serde_json::Value) -> Value {
    Value::from(expected)
}

fn bounds(start: (i64, i64, i64), end: (i64, i64, i64)) -> serde_json::Value {
    json!({
        "start": {"offset": start.0, "line": start.1, "column": start.2},
        "end": {"offset": end.0, "line": end.1, "column": end.2}
    })
}

fn all_bounds_parser(grammar: &str) -> Parser {
    let grammar = GrammarSpec::from_json(grammar).expect("valid grammar");
    Parser::with_options(&grammar, ParserOptions::new().with_capture_all_bounds(true))
        .expect("grammar compiles")
}

// ============================================================================
// Single Component Bounds
// ============================================================================

fn operand_grammar(number: &str, right: ComponentSpec) -> GrammarSpec {
    GrammarSpec::new("expression")
        .ignore("whitespace")
        .rule("operator", re(r"\+"))
        .rule("number", re(number))
        .rule("whitespace", re(r"\s+"))
        .rule(
            "expression",
            seq([
                rule_ref("number").named("left"),
                rule_ref("operator").named("operator"),
                right,
            ]),
        )
}

#[test]
fn test_named_component_bounds() {
    let grammar = operand_grammar(
        r"\d(?:\.\d+)?",
        rule_ref("number")
            .named("right")
            .capture_bounds_as("capturedRightOffset"),
    );
    let parser = Parser::new(&grammar).unwrap();

    assert_eq!(
        parser.parse("\n\n1 + 2").unwrap(),
        ast(json!({
            "name": "expression",
            "left": "1",
            "operator": "+",
            "right": "2",
            "capturedRightOffset": bounds((6, 3, 5), (7, 3, 6))
        }))
    );
}

#[test]
fn test_unnamed_component_bounds_only() {
    let grammar = operand_grammar(
        r"\d(?:\.\d+)?",
        rule_ref("number").capture_bounds_as("capturedRightOffset"),
    );
    let parser = Parser::new(&grammar).unwrap();

    assert_eq!(
        parser.parse("\n\n1 + 2").unwrap(),
        ast(json!({
            "name": "expression",
            "left": "1",
            "operator": "+",
            "capturedRightOffset": bounds((6, 3, 5), (7, 3, 6))
        }))
    );
}

#[test]
fn test_component_bounds_longer_match() {
    let grammar = operand_grammar(
        r"\d+(?:\.\d+)?",
        rule_ref("number").capture_bounds_as("capturedRightOffset"),
    );
    let parser = Parser::new(&grammar).unwrap();

    assert_eq!(
        parser.parse("\n\n126 + 24123").unwrap(),
        ast(json!({
            "name": "expression",
            "left": "126",
            "operator": "+",
            "capturedRightOffset": bounds((8, 3, 7), (13, 3, 12))
        }))
    );
}

#[test]
fn test_capture_offset_as_json_alias() {
    let grammar = GrammarSpec::from_json(
        r#"{
            "ignore": "whitespace",
            "start": "expression",
            "rules": {
                "operator": "/\\+/",
                "number": "/\\d(?:\\.\\d+)?/",
                "whitespace": "/\\s+/",
                "expression": {"components": [
                    {"name": "left", "what": "number"},
                    {"name": "operator", "what": "operator"},
                    {"what": "number", "captureOffsetAs": "capturedRightOffset"}
                ]}
            }
        }"#,
    )
    .unwrap();
    let parser = Parser::new(&grammar).unwrap();

    let value = parser.parse("\n\n1 + 2").unwrap();
    assert_eq!(
        value.get("capturedRightOffset"),
        Some(&ast(bounds((6, 3, 5), (7, 3, 6))))
    );
}

// ============================================================================
// Capture All Bounds
// ============================================================================

#[test]
fn test_all_bounds_single_what() {
    let parser = all_bounds_parser(
        r#"{
            "ignore": "whitespace",
            "start": "my_rule",
            "bounds": "my_bounds",
            "rules": {
                "my_rule": {"components": [{"name": "my_capture", "what": "/my\\s+\\w+/"}]},
                "whitespace": "/\\s+/"
            }
        }"#,
    );

    assert_eq!(
        parser.parse("  my\n text  ").unwrap(),
        ast(json!({
            "name": "my_rule",
            "my_capture": "my\n text",
            "my_bounds": bounds((2, 1, 3), (10, 2, 6))
        }))
    );
}

#[test]
fn test_all_bounds_one_of() {
    let parser = all_bounds_parser(
        r#"{
            "ignore": "whitespace",
            "start": "my_rule",
            "bounds": "my_bounds",
            "rules": {
                "my_rule": {"components": {"oneOf": [
                    {"name": "your_capture", "what": "/your\\n \\w+/"},
                    {"name": "my_capture", "what": "/my\\n \\w+/"}
                ]}},
                "whitespace": "/\\s+/"
            }
        }"#,
    );

    assert_eq!(
        parser.parse("  my\n text  ").unwrap(),
        ast(json!({
            "name": "my_rule",
            "my_capture": "my\n text",
            "my_bounds": bounds((2, 1, 3), (10, 2, 6))
        }))
    );
}

#[test]
fn test_all_bounds_end_of_input_in_what() {
    let parser = all_bounds_parser(
        r#"{
            "ignore": "whitespace",
            "start": "my_rule",
            "bounds": "my_bounds",
            "rules": {
                "my_rule": {"components": [
                    {"name": "my_capture", "what": ["/my\\s+\\w+/", "<EOF>"]}
                ]},
                "whitespace": "/\\s+/"
            }
        }"#,
    );

    assert_eq!(
        parser.parse("  my\n text").unwrap(),
        ast(json!({
            "name": "my_rule",
            "my_capture": "my\n text",
            "my_bounds": bounds((2, 1, 3), (10, 2, 6))
        }))
    );
}

#[test]
fn test_all_bounds_rule_qualifier() {
    let parser = all_bounds_parser(
        r#"{
            "ignore": "whitespace",
            "start": "my_rule",
            "bounds": "my_bounds",
            "rules": {
                "my_other_rule": {"components": {"name": "my_text", "what": "/my\\n\\n \\w+/"}},
                "my_rule": {"components": [
                    {"name": "first_capture", "rule": "my_other_rule"},
                    {"name": "second_capture", "what": "my_other_rule"}
                ]},
                "whitespace": "/\\s+/"
            }
        }"#,
    );

    assert_eq!(
        parser.parse("   my\n\n stuff my\n\n things  ").unwrap(),
        ast(json!({
            "name": "my_rule",
            "first_capture": {
                "name": "my_other_rule",
                "my_text": "my\n\n stuff",
                "my_bounds": bounds((3, 1, 4), (13, 3, 7))
            },
            "second_capture": {
                "name": "my_other_rule",
                "my_text": "my\n\n things",
                "my_bounds": bounds((14, 3, 8), (25, 5, 8))
            },
            "my_bounds": bounds((3, 1, 4), (25, 5, 8))
        }))
    );
}

#[test]
fn test_all_bounds_what_qualifier() {
    let parser = all_bounds_parser(
        r#"{
            "ignore": "whitespace",
            "start": "my_rule",
            "bounds": "my_bounds",
            "rules": {
                "my_other_rule": {"components": {"name": "my_other_capture", "what": "/my\\n\\n \\w+/"}},
                "my_rule": {"components": [
                    {"name": "first_capture", "what": "/my\\n\\n \\w+/"},
                    {"name": "second_capture", "what": "my_other_rule"}
                ]},
                "whitespace": "/\\s+/"
            }
        }"#,
    );

    assert_eq!(
        parser.parse("   my\n\n stuff my\n\n things  ").unwrap(),
        ast(json!({
            "name": "my_rule",
            "first_capture": "my\n\n stuff",
            "second_capture": {
                "name": "my_other_rule",
                "my_other_capture": "my\n\n things",
                "my_bounds": bounds((14, 3, 8), (25, 5, 8))
            },
            "my_bounds": bounds((3, 1, 4), (25, 5, 8))
        }))
    );
}

#[test]
fn test_all_bounds_repetitions() {
    let parser = all_bounds_parser(
        r#"{
            "ignore": "whitespace",
            "start": "my_rule",
            "bounds": "my_bounds",
            "rules": {
                "my_rule": {"components": [
                    {"name": "first_capture", "zeroOrMoreOf": {"what": "/my\\n \\w+/"}},
                    {"name": "second_capture", "zeroOrMoreOf": {"what": "/your\\n \\w+/"}}
                ]},
                "whitespace": "/\\s+/"
            }
        }"#,
    );

    assert_eq!(
        parser.parse("  my\n first my\n second  ").unwrap(),
        ast(json!({
            "name": "my_rule",
            "first_capture": ["my\n first", "my\n second"],
            "second_capture": [],
            "my_bounds": bounds((2, 1, 3), (22, 3, 8))
        }))
    );
}

#[test]
fn test_all_bounds_one_or_more_of() {
    let parser = all_bounds_parser(
        r#"{
            "ignore": "whitespace",
            "start": "my_rule",
            "bounds": "my_bounds",
            "rules": {
                "my_rule": {"components": {"name": "my_capture", "oneOrMoreOf": {"what": "/my\\n \\w+/"}}},
                "whitespace": "/\\s+/"
            }
        }"#,
    );

    assert_eq!(
        parser.parse("  my\n first my\n second  ").unwrap(),
        ast(json!({
            "name": "my_rule",
            "my_capture": ["my\n first", "my\n second"],
            "my_bounds": bounds((2, 1, 3), (22, 3, 8))
        }))
    );
    assert!(parser.parse("your\n first your\n second  ").is_err());
}

#[test]
fn test_all_bounds_optionally() {
    let parser = all_bounds_parser(
        r#"{
            "ignore": "whitespace",
            "start": "my_rule",
            "bounds": "my_bounds",
            "rules": {
                "my_stuff": {"components": [
                    {"name": "my", "what": "/my/"},
                    {"optionally": {"name": "stuff_word", "what": "/stuff/"}}
                ]},
                "my_rule": {"components": {"name": "my_capture", "oneOrMoreOf": "my_stuff"}},
                "whitespace": "/\\s+/"
            }
        }"#,
    );

    assert_eq!(
        parser.parse("  my\n stuff my\n  ").unwrap(),
        ast(json!({
            "name": "my_rule",
            "my_capture": [
                {
                    "name": "my_stuff",
                    "my": "my",
                    "stuff_word": "stuff",
                    "my_bounds": bounds((2, 1, 3), (11, 2, 7))
                },
                {
                    "name": "my_stuff",
                    "my": "my",
                    "my_bounds": bounds((12, 2, 8), (14, 2, 10))
                }
            ],
            "my_bounds": bounds((2, 1, 3), (14, 2, 10))
        }))
    );
}

#[test]
fn test_all_bounds_default_name() {
    let grammar = GrammarSpec::new("number").rule("number", re(r"\d+").named("value"));
    let parser =
        Parser::with_options(&grammar, ParserOptions::new().with_capture_all_bounds(true))
            .unwrap();

    assert_eq!(
        parser.parse("42").unwrap(),
        ast(json!({
            "name": "number",
            "value": "42",
            "bounds": bounds((0, 1, 1), (2, 1, 3))
        }))
    );
}

// ============================================================================
// Whole Program Bounds
// ============================================================================

fn program_grammar() -> GrammarSpec {
    GrammarSpec::new("program")
        .ignore("whitespace")
        .bounds("my_offset")
        .rule("go_statement", seq([re("go").no_merge()]))
        .rule(
            "do_something_statement",
            seq([
                re("do_something_custom").no_merge(),
                rule(rule_ref("do_thing_arg")).named("thing"),
            ]),
        )
        // Multiple terminals to exercise string concatenation
        .rule("some_identifier", seq([re(r"\w"), re(r"\w+")]))
        .rule(
            "do_thing_arg",
            rule(rule_ref("with_fallback")).named("fallen_back_identifier"),
        )
        .rule(
            "with_fallback",
            RuleSpec::new(seq([
                optionally(re("AAAA")).named("something_that_wont_match"),
                rule(rule_ref("some_identifier")).named("identifier"),
            ]))
            .if_no_match("something_that_wont_match", "identifier"),
        )
        .rule(
            "end_statement",
            // Drops the bounds; they are restored after the processor runs
            RuleSpec::new(seq([re("end").no_merge()]))
                .processor(|_, _| Ok(Some(Value::hash([("name", Value::string("end_statement"))])))),
        )
        .rule("whitespace", re(r"\s+"))
        .rule(
            "single_statement",
            one_of([
                rule_ref("go_statement"),
                rule_ref("do_something_statement"),
                rule_ref("end_statement"),
            ]),
        )
        .rule("statement", seq([rule_ref("single_statement"), re(";")]))
        .rule("program", zero_or_more_of("statement").named("statements"))
}

#[test]
fn test_all_bounds_whole_program() {
    let parser = Parser::with_options(
        &program_grammar(),
        ParserOptions::new().with_capture_all_bounds(true),
    )
    .unwrap();
    let code = "go;\n\n\n  do_something_custom   open_it;\n\n\n    end;";
    assert_eq!(code.len(), 49);

    assert_eq!(
        parser.parse(code).unwrap(),
        ast(json!({
            "name": "program",
            "statements": [
                {
                    "name": "go_statement",
                    "my_offset": bounds((0, 1, 1), (3, 1, 4))
                },
                {
                    "name": "do_something_statement",
                    "thing": {
                        "name": "do_thing_arg",
                        "fallen_back_identifier": "open_it",
                        "my_offset": bounds((30, 4, 25), (37, 4, 32))
                    },
                    "my_offset": bounds((8, 4, 3), (38, 4, 33))
                },
                {
                    "name": "end_statement",
                    "my_offset": bounds((45, 7, 5), (49, 7, 9))
                }
            ],
            "my_offset": bounds((0, 1, 1), (49, 7, 9))
        }))
    );
}

#[test]
fn test_bounds_off_by_default() {
    let parser = Parser::new(&program_grammar()).unwrap();

    assert_eq!(
        parser.parse("go; end;").unwrap(),
        ast(json!({
            "name": "program",
            "statements": [{"name": "go_statement"}, {"name": "end_statement"}]
        }))
    );
}
