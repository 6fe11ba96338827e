//! Match records and capture merging
//!
//! Every qualifier, component and rule produces a [`Match`]: the capture
//! payload plus the span bookkeeping needed to compute bounds without
//! rescanning the input. Spans are relative to the [`Cursor`] the match
//! was attempted at.

use super::source_location::{column_from_line_start, SourcePosition, SourceSpan};
use super::value::Value;

/// Where a match attempt starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Byte offset into the input
    pub offset: usize,
    /// 0-based line of `offset`
    pub line: usize,
    /// Offset of the first byte of `line`
    pub line_start: usize,
}

impl Cursor {
    /// Cursor at the start of input
    pub const START: Cursor = Cursor {
        offset: 0,
        line: 0,
        line_start: 0,
    };

    /// Create a cursor
    #[inline]
    pub fn new(offset: usize, line: usize, line_start: usize) -> Self {
        Self {
            offset,
            line,
            line_start,
        }
    }
}

/// A successful match
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// The capture payload
    pub components: Value,
    /// Skipped ignorable input before the match, relative to the cursor
    pub text_offset: usize,
    /// Matched length, excluding the skipped prefix
    pub text_length: usize,
    /// Set only by an `optionally` that matched nothing
    pub is_empty: bool,
    /// 0-based line of the match start
    pub first_line: usize,
    /// Offset of the first byte of `first_line`
    pub first_line_offset: usize,
    /// Newlines between the cursor and the match end
    pub lines: usize,
    /// 0-based line of the match end
    pub last_line: usize,
    /// Offset of the first byte of `last_line`
    pub last_line_offset: usize,
}

impl Match {
    /// A zero-length match at `at` that consumed nothing
    pub fn zero_width(at: Cursor, components: Value) -> Self {
        Self {
            components,
            text_offset: 0,
            text_length: 0,
            is_empty: false,
            first_line: at.line,
            first_line_offset: at.line_start,
            lines: 0,
            last_line: at.line,
            last_line_offset: at.line_start,
        }
    }

    /// The synthetic result of an `optionally` whose child failed
    pub fn empty(at: Cursor, components: Value) -> Self {
        Self {
            is_empty: true,
            ..Self::zero_width(at, components)
        }
    }

    /// Total input consumed, including the skipped prefix
    #[inline]
    pub fn consumed(&self) -> usize {
        self.text_offset + self.text_length
    }

    /// Absolute start offset of the matched content
    #[inline]
    pub fn start(&self, at: Cursor) -> usize {
        at.offset + self.text_offset
    }

    /// Absolute end offset of the matched content
    #[inline]
    pub fn end(&self, at: Cursor) -> usize {
        at.offset + self.consumed()
    }

    /// Cursor just after this match
    #[inline]
    pub fn end_cursor(&self, at: Cursor) -> Cursor {
        Cursor::new(self.end(at), at.line + self.lines, self.last_line_offset)
    }

    /// Line/column span of the matched content
    pub fn span(&self, text: &str, at: Cursor) -> SourceSpan {
        let start = self.start(at);
        let end = self.end(at);
        SourceSpan::new(
            SourcePosition::new(
                start,
                self.first_line + 1,
                column_from_line_start(text, self.first_line_offset, start),
            ),
            SourcePosition::new(
                end,
                self.last_line + 1,
                column_from_line_start(text, self.last_line_offset, end),
            ),
        )
    }
}

/// Accumulates child matches for the sequence and repetition qualifiers.
pub(crate) struct Accumulator {
    origin: Cursor,
    cursor: Cursor,
    components: Vec<Value>,
    text_offset: Option<usize>,
    text_length: usize,
    first_line: Option<(usize, usize)>,
    lines: usize,
    count: usize,
}

impl Accumulator {
    pub(crate) fn new(at: Cursor) -> Self {
        Self {
            origin: at,
            cursor: at,
            components: Vec::new(),
            text_offset: None,
            text_length: 0,
            first_line: None,
            lines: 0,
            count: 0,
        }
    }

    /// Where the next child should be attempted
    #[inline]
    pub(crate) fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Number of children pushed so far
    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn push(&mut self, child: Match) {
        self.count += 1;
        let consumed = child.consumed();
        self.components.push(child.components);
        if child.is_empty {
            return;
        }

        if self.first_line.is_none() {
            self.first_line = Some((child.first_line, child.first_line_offset));
        }
        match self.text_offset {
            None => {
                self.text_offset = Some(child.text_offset);
                self.text_length += child.text_length;
            }
            // Skipped input between children belongs to the parent's content
            Some(_) => self.text_length += consumed,
        }
        self.lines += child.lines;
        let offset = self.origin.offset + self.text_offset.unwrap_or(0) + self.text_length;
        self.cursor = Cursor::new(
            offset,
            self.origin.line + self.lines,
            child.last_line_offset,
        );
    }

    fn finish(self, components: Value) -> Match {
        let (first_line, first_line_offset) = self
            .first_line
            .unwrap_or((self.origin.line, self.origin.line_start));
        Match {
            components,
            text_offset: self.text_offset.unwrap_or(0),
            text_length: self.text_length,
            is_empty: false,
            first_line,
            first_line_offset,
            lines: self.lines,
            last_line: self.origin.line + self.lines,
            last_line_offset: self.cursor.line_start,
        }
    }

    /// Finish with the children as a plain array
    pub(crate) fn into_array(mut self) -> Match {
        let items = std::mem::take(&mut self.components);
        self.finish(Value::Array(items))
    }
}

/// Merge the captures of an anonymous group.
///
/// A group made only of strings concatenates into one string. Otherwise
/// the map captures are merged in order (later keys win) and everything
/// else is dropped.
pub fn merge_sequence(items: Vec<Value>) -> Value {
    if items.iter().all(|v| matches!(v, Value::String(_))) {
        let mut joined = String::new();
        for item in &items {
            if let Value::String(s) = item {
                joined.push_str(s);
            }
        }
        return Value::String(joined);
    }

    let mut merged = Value::empty_hash();
    for item in items {
        if let Value::Hash(map) = item {
            for (key, value) in map {
                merged.insert(key, value);
            }
        }
    }
    merged
}

/// Wrap a capture into a fresh map under `name` (or into an empty map
/// when unnamed).
pub fn wrap_named(name: Option<&str>, capture: Value) -> Value {
    let mut map = Value::empty_hash();
    if let Some(name) = name {
        map.insert(name, capture);
    }
    map
}
