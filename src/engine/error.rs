//! Error types
//!
//! [`GrammarError`] is raised while compiling a grammar and means the grammar
//! itself is malformed. [`ParseException`] describes a failed parse: either
//! the furthest point the grammar reached, or a failure a processor or
//! modifier raised explicitly.

use super::source_location::{line_of, SourcePosition};
use super::value::Value;
use std::fmt;
use std::sync::Arc;

/// Error raised while compiling a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A component referenced a rule that does not exist
    UnknownRule {
        /// The missing rule name
        name: String,
        /// The rule whose body contains the reference, if any
        referenced_by: Option<String>,
    },

    /// An object spec carried no recognized qualifier and more than one key
    MissingQualifier {
        /// The offending spec, rendered as JSON
        spec: String,
    },

    /// A value that cannot be turned into a component
    InvalidComponent {
        /// The offending spec, rendered as JSON
        spec: String,
    },

    /// A regex terminal or replacement pattern failed to compile
    InvalidRegex {
        /// The pattern as written in the grammar
        pattern: String,
        /// The regex engine's message
        message: String,
    },

    /// The grammar document is not valid JSON or has the wrong shape
    InvalidJson {
        /// Reason the document was rejected
        reason: String,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UnknownRule {
                name,
                referenced_by: Some(owner),
            } => write!(f, "no rule with name \"{}\" exists (referenced by \"{}\")", name, owner),
            GrammarError::UnknownRule { name, .. } => {
                write!(f, "no rule with name \"{}\" exists", name)
            }
            GrammarError::MissingQualifier { spec } => {
                write!(f, "no valid qualifier in component spec {}", spec)
            }
            GrammarError::InvalidComponent { spec } => {
                write!(f, "invalid component spec {}", spec)
            }
            GrammarError::InvalidRegex { pattern, message } => {
                write!(f, "invalid regex /{}/: {}", pattern, message)
            }
            GrammarError::InvalidJson { reason } => write!(f, "invalid grammar JSON: {}", reason),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Why a parse failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Nothing in the input matched at all
    NoMatch,
    /// Matching stopped before the end of input
    Unexpected,
    /// Matching reached the end of input but the grammar wanted more
    UnexpectedEndOfInput,
    /// A processor or modifier aborted the parse
    Aborted,
    /// The recursion limit was hit, usually because of left recursion
    RecursionLimit,
    /// `parse` was called while this parser was already parsing
    ParserBusy,
    /// The requested start rule does not exist
    UnknownStartRule,
}

impl ParseErrorKind {
    /// Fatal errors bypass the grammar's error handler
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ParseErrorKind::RecursionLimit
                | ParseErrorKind::ParserBusy
                | ParseErrorKind::UnknownStartRule
        )
    }
}

/// A failed parse
#[derive(Debug, Clone, PartialEq)]
pub struct ParseException {
    kind: ParseErrorKind,
    message: String,
    text: Arc<str>,
    start: Option<usize>,
    end: Option<usize>,
    context: Option<Value>,
}

impl ParseException {
    /// Create an exception over `text`
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        text: impl Into<Arc<str>>,
        start: Option<usize>,
        end: Option<usize>,
    ) -> Self {
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) if e < s => (Some(s), Some(s)),
            other => other,
        };
        Self {
            kind,
            message: message.into(),
            text: text.into(),
            start,
            end,
            context: None,
        }
    }

    /// Attach a caller-supplied context value
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Why the parse failed
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The full input text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Caller-supplied context, set by aborts
    pub fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    /// Start offset of the failing range, `None` when nothing matched
    pub fn start_offset(&self) -> Option<usize> {
        self.start
    }

    /// End offset of the failing range, `None` when nothing matched
    pub fn end_offset(&self) -> Option<usize> {
        self.end
    }

    /// 1-based line of the start offset
    pub fn start_line(&self) -> Option<usize> {
        self.start.map(|offset| line_of(&self.text, offset))
    }

    /// 1-based line of the end offset
    pub fn end_line(&self) -> Option<usize> {
        self.end.map(|offset| line_of(&self.text, offset))
    }

    /// Position of the end offset
    pub fn end_position(&self) -> Option<SourcePosition> {
        self.end
            .map(|offset| SourcePosition::from_offset(&self.text, offset))
    }

    /// Whether the parse failed because the input ran out
    pub fn unexpected_end_of_input(&self) -> bool {
        self.end == Some(self.text.len())
    }
}

impl fmt::Display for ParseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end_position() {
            Some(pos) => write!(f, "{} at {}", self.message, pos),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseException {}
