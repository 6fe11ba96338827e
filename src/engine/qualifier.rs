//! The qualifier algebra
//!
//! Seven matching strategies share one shape: given a component (for its
//! arguments), the pass and a cursor, produce a match or nothing.
//!
//! | Qualifier      | Behavior                                             |
//! |----------------|------------------------------------------------------|
//! | `allOf`        | every child in order, all or nothing                 |
//! | `oneOf`        | first child that matches                             |
//! | `oneOrMoreOf`  | greedy repetition, at least once                     |
//! | `zeroOrMoreOf` | greedy repetition, never fails                       |
//! | `optionally`   | child or an empty match                              |
//! | `rule`         | delegate to a rule, optionally requiring exact text  |
//! | `what`         | terminal: literal, regex, delegation or sentinel     |

use super::capture::{Accumulator, Cursor, Match};
use super::component::{Component, ComponentId};
use super::error::ParseException;
use super::pass::{MatchOptions, MatchResult, Pass};
use super::rule::RuleId;
use super::source_location::{count_newlines, last_newline_boundary};
use super::value::Value;
use regex::Regex;

/// Compiled qualifier and its argument
#[derive(Debug)]
pub(crate) enum Qualifier {
    AllOf(Vec<ComponentId>),
    OneOf(Vec<ComponentId>),
    OneOrMoreOf(ComponentId),
    ZeroOrMoreOf(ComponentId),
    Optionally(ComponentId),
    Rule(Target),
    What(Terminal),
}

/// What a `rule` qualifier delegates to
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target {
    Rule(RuleId),
    Component(ComponentId),
}

/// Argument of a `what` qualifier
#[derive(Debug)]
pub(crate) enum Terminal {
    Literal(String),
    /// Anchored with `^(?:...)`
    Pattern(Regex),
    Component(ComponentId),
    Sentinel(Sentinel),
}

/// Zero-width positional matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sentinel {
    BeginningOfInput,
    EndOfInput,
}

pub(crate) fn apply(
    component: &Component,
    pass: &mut Pass<'_>,
    at: Cursor,
    opts: MatchOptions,
) -> MatchResult {
    match &component.qualifier {
        Qualifier::AllOf(children) => all_of(children, pass, at, opts),
        Qualifier::OneOf(children) => one_of(children, pass, at, opts),
        Qualifier::OneOrMoreOf(child) => repeat(*child, 1, pass, at, opts),
        Qualifier::ZeroOrMoreOf(child) => repeat(*child, 0, pass, at, opts),
        Qualifier::Optionally(child) => optionally(component, *child, pass, at, opts),
        Qualifier::Rule(target) => rule(component, *target, pass, at, opts),
        Qualifier::What(terminal) => what(component, terminal, pass, at, opts),
    }
}

fn all_of(
    children: &[ComponentId],
    pass: &mut Pass<'_>,
    at: Cursor,
    opts: MatchOptions,
) -> MatchResult {
    let mut acc = Accumulator::new(at);
    for &child in children {
        match pass.match_component(child, acc.cursor(), opts)? {
            Some(m) => acc.push(m),
            None => return Ok(None),
        }
    }
    Ok(Some(acc.into_array()))
}

fn one_of(
    children: &[ComponentId],
    pass: &mut Pass<'_>,
    at: Cursor,
    opts: MatchOptions,
) -> MatchResult {
    for &child in children {
        if let Some(m) = pass.match_component(child, at, opts)? {
            return Ok(Some(m));
        }
    }
    Ok(None)
}

fn repeat(
    child: ComponentId,
    min: usize,
    pass: &mut Pass<'_>,
    at: Cursor,
    opts: MatchOptions,
) -> MatchResult {
    let mut acc = Accumulator::new(at);
    while let Some(m) = pass.match_component(child, acc.cursor(), opts)? {
        let progressed = m.consumed() > 0;
        acc.push(m);
        // A zero-width repetition would loop forever
        if !progressed {
            break;
        }
    }
    if acc.count() < min {
        return Ok(None);
    }
    Ok(Some(acc.into_array()))
}

fn optionally(
    component: &Component,
    child: ComponentId,
    pass: &mut Pass<'_>,
    at: Cursor,
    opts: MatchOptions,
) -> MatchResult {
    match pass.match_component(child, at, opts)? {
        Some(mut m) => {
            if component.wrap_in_array {
                m.components = Value::Array(vec![std::mem::take(&mut m.components)]);
            }
            Ok(Some(m))
        }
        None => {
            let nothing = if component.wrap_in_array {
                Value::Array(Vec::new())
            } else {
                Value::string("")
            };
            Ok(Some(Match::empty(at, nothing)))
        }
    }
}

fn rule(
    component: &Component,
    target: Target,
    pass: &mut Pass<'_>,
    at: Cursor,
    opts: MatchOptions,
) -> MatchResult {
    let matched = match target {
        Target::Rule(id) => pass.match_rule(id, at, opts)?,
        Target::Component(id) => pass.match_component(id, at, opts)?,
    };
    let Some(m) = matched else {
        return Ok(None);
    };

    if let Some(expected) = &component.text {
        let start = m.start(at);
        if pass.text().get(start..start + m.text_length) != Some(expected.as_str()) {
            return Ok(None);
        }
    }
    Ok(Some(m))
}

fn what(
    component: &Component,
    terminal: &Terminal,
    pass: &mut Pass<'_>,
    at: Cursor,
    opts: MatchOptions,
) -> MatchResult {
    match terminal {
        Terminal::Literal(literal) => {
            let from = pass.skip_ignored(at, opts)?;
            if !pass.text()[from.offset..].starts_with(literal.as_str()) {
                return Ok(None);
            }
            let capture = Value::string(component.apply_replacements(literal.clone()));
            Ok(Some(terminal_match(pass.text(), at, from, literal.len(), capture)))
        }
        Terminal::Pattern(regex) => {
            let from = pass.skip_ignored(at, opts)?;
            let rest = &pass.text()[from.offset..];
            let Some(caps) = regex.captures(rest) else {
                return Ok(None);
            };
            let Some(whole) = caps.get(0).filter(|m| m.start() == 0) else {
                return Ok(None);
            };
            let group = caps
                .get(component.capture_index)
                .map_or("", |g| g.as_str())
                .to_string();
            let capture = Value::string(component.apply_replacements(group));
            Ok(Some(terminal_match(pass.text(), at, from, whole.end(), capture)))
        }
        Terminal::Component(id) => {
            let Some(mut m) = pass.match_component(*id, at, opts)? else {
                return Ok(None);
            };
            if let Value::String(s) = &mut m.components {
                *s = component.apply_replacements(std::mem::take(s));
            }
            Ok(Some(m))
        }
        Terminal::Sentinel(sentinel) => sentinel_match(*sentinel, pass, at, opts),
    }
}

fn sentinel_match(
    sentinel: Sentinel,
    pass: &mut Pass<'_>,
    at: Cursor,
    opts: MatchOptions,
) -> Result<Option<Match>, ParseException> {
    let from = pass.skip_ignored(at, opts)?;
    let matches = match sentinel {
        Sentinel::BeginningOfInput => at.offset == 0,
        Sentinel::EndOfInput => from.offset == pass.text().len(),
    };
    if !matches {
        return Ok(None);
    }
    Ok(Some(terminal_match(
        pass.text(),
        at,
        from,
        0,
        Value::string(""),
    )))
}

/// Build the match for `length` bytes of terminal input at `from`, where
/// `from` is `at` advanced past skipped input.
fn terminal_match(text: &str, at: Cursor, from: Cursor, length: usize, capture: Value) -> Match {
    let end = from.offset + length;
    let newlines = count_newlines(&text[from.offset..end]);
    let last_line_offset = if newlines > 0 {
        last_newline_boundary(text, end - 1)
    } else {
        from.line_start
    };
    Match {
        components: capture,
        text_offset: from.offset - at.offset,
        text_length: length,
        is_empty: false,
        first_line: from.line,
        first_line_offset: from.line_start,
        lines: (from.line - at.line) + newlines,
        last_line: from.line + newlines,
        last_line_offset,
    }
}
