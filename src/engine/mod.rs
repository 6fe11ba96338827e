//! Matching engine
//!
//! # Module Organization
//!
//! ## Grammar Input
//! - [`grammar`] - Grammar, rule and component specifications, builder DSL
//!   and JSON loading
//!
//! ## Compiled Graph
//! - `compiler` - Turns a specification into rule and component arenas
//! - `rule` - Memoized rules with fallbacks and processors
//! - `component` - Qualifier application, naming, merging and bounds
//! - `qualifier` - The seven matching strategies
//!
//! ## Matching
//! - [`parser`] - The [`Parser`] entry point and its options
//! - `pass` - State of one parse pass
//! - [`cache`] - Per-pass memo cache
//! - [`capture`] - Match records and capture merging
//! - [`callback`] - Processor, modifier and error handler hooks
//!
//! ## Support
//! - [`value`] - The AST value type
//! - [`error`] - Grammar and parse errors
//! - [`source_location`] - Line and column tracking
//! - [`regex_cache`] - Compiled pattern cache

// ============================================================================
// Module Declarations
// ============================================================================

pub mod cache;
pub mod callback;
pub mod capture;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod regex_cache;
pub mod source_location;
pub mod value;

mod compiler;
mod component;
mod pass;
mod qualifier;
mod rule;

// ============================================================================
// Core Types
// ============================================================================

pub use parser::{
    ParseOptions, Parser, ParserOptions, DEFAULT_MAX_RECURSION_DEPTH, DEFAULT_MAX_STACK_BYTES,
};
pub use value::Value;

// ============================================================================
// Grammar
// ============================================================================

pub use compiler::DEFAULT_BOUNDS_NAME;
pub use grammar::{
    ComponentArgs, ComponentSpec, GrammarSpec, IfNoMatch, QualifiedSpec, QualifierSpec,
    ReplaceSpec, RuleSpec,
};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{GrammarError, ParseErrorKind, ParseException};

// ============================================================================
// Callbacks
// ============================================================================

pub use callback::{
    Callback, CallbackContext, CallbackResult, ErrorHandler, ErrorHandlerFactory, State,
    StateFactory,
};

// ============================================================================
// Matching
// ============================================================================

pub use cache::CacheStats;
pub use capture::{Cursor, Match};
pub use component::ComponentId;
pub use pass::{MatchOptions, MatchResult};
pub use rule::RuleId;

// ============================================================================
// Source Location
// ============================================================================

pub use source_location::{
    column_of, count_newlines, last_newline_boundary, line_of, SourcePosition, SourceSpan,
};
