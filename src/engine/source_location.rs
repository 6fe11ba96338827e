//! Source Location Utilities
//!
//! Pure helpers mapping byte offsets to line and column numbers. Lines and
//! columns are 1-based, offsets are 0-based byte offsets. Columns count
//! characters, so they stay correct for multi-byte UTF-8 input.

use super::value::Value;
use memchr::{memchr_iter, memrchr};
use std::fmt;

/// Count the newlines in `text`.
///
/// Both `\n` and `\r\n` count as a single newline.
#[inline]
pub fn count_newlines(text: &str) -> usize {
    memchr_iter(b'\n', text.as_bytes()).count()
}

/// 1-based line number of `offset` within `text`.
pub fn line_of(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    count_newlines_in(&text.as_bytes()[..end]) + 1
}

/// 1-based column number of `offset` within `text`.
pub fn column_of(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    let bytes = &text.as_bytes()[..end];
    let line_start = memrchr(b'\n', bytes).map_or(0, |i| i + 1);
    char_count(&bytes[line_start..]) + 1
}

/// Offset just after the nearest newline at or before `offset`, or 0 if
/// there is none.
///
/// This is the start offset of the line that the position just after
/// `offset` belongs to.
pub fn last_newline_boundary(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return 0;
    }
    let end = offset.min(bytes.len() - 1);
    memrchr(b'\n', &bytes[..=end]).map_or(0, |i| i + 1)
}

/// Column of `offset` given the start offset of its line.
#[inline]
pub(crate) fn column_from_line_start(text: &str, line_start: usize, offset: usize) -> usize {
    let bytes = text.as_bytes();
    let end = offset.min(bytes.len());
    let start = line_start.min(end);
    char_count(&bytes[start..end]) + 1
}

#[inline]
fn count_newlines_in(bytes: &[u8]) -> usize {
    memchr_iter(b'\n', bytes).count()
}

/// Count UTF-8 characters by skipping continuation bytes.
#[inline]
fn char_count(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count()
}

/// A position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// Byte offset from start of input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, UTF-8 aware)
    pub column: usize,
}

impl SourcePosition {
    /// Create a new source position
    #[inline]
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Calculate the position of `offset` in `input`
    pub fn from_offset(input: &str, offset: usize) -> Self {
        Self {
            offset,
            line: line_of(input, offset),
            column: column_of(input, offset),
        }
    }

    /// Convert to a `{offset, line, column}` capture map
    pub fn to_value(&self) -> Value {
        Value::hash([
            ("offset", Value::int(self.offset as i64)),
            ("line", Value::int(self.line as i64)),
            ("column", Value::int(self.column as i64)),
        ])
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

/// A range in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceSpan {
    /// Start position
    pub start: SourcePosition,
    /// End position (exclusive)
    pub end: SourcePosition,
}

impl SourceSpan {
    /// Create a new span
    #[inline]
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Create a span from offsets
    pub fn from_offsets(input: &str, start_offset: usize, end_offset: usize) -> Self {
        Self {
            start: SourcePosition::from_offset(input, start_offset),
            end: SourcePosition::from_offset(input, end_offset),
        }
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Whether the span covers no input
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The covered slice of `input`
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.start.offset..self.end.offset).unwrap_or("")
    }

    /// Convert to the `{start: {...}, end: {...}}` bounds capture map
    pub fn to_value(&self) -> Value {
        Value::hash([("start", self.start.to_value()), ("end", self.end.to_value())])
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(
                f,
                "line {}, columns {}-{}",
                self.start.line, self.start.column, self.end.column
            )
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}
