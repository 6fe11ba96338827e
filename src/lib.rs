//! Parsling - Grammar-Driven Parser Engine
//!
//! A grammar is a set of named rules built from seven qualifiers (sequence,
//! alternation, two repetitions, optionality, rule delegation and terminal
//! matching). Parsling compiles it into a graph of memoized rules and runs
//! that graph over a string, producing either an AST of nested [`Value`]s
//! or a [`ParseException`] pointing at the furthest point the grammar
//! reached.
//!
//! It provides:
//! - Packrat memoization per parse pass
//! - Whitespace skipping through a grammar-defined ignore rule
//! - Capture naming and merging, with optional line/column bounds
//! - Processor and modifier callbacks that may transform captures, fail a
//!   match, abort the parse or parse another text reentrantly
//! - Grammars written with a builder DSL or loaded from JSON
//!
//! ## Quick Start
//!
//! ```rust
//! use parsling::grammar::*;
//! use parsling::{Parser, Value};
//!
//! let grammar = GrammarSpec::new("list")
//!     .ignore("whitespace")
//!     .rule("whitespace", re(r"\s+"))
//!     .rule("item", re(r"\w+"))
//!     .rule(
//!         "list",
//!         seq([
//!             rule_ref("item").named("first"),
//!             zero_or_more_of(seq([re(","), rule_ref("item")])).named("rest"),
//!         ]),
//!     );
//!
//! let parser = Parser::new(&grammar).unwrap();
//! let ast = parser.parse("a, b, c").unwrap();
//! assert_eq!(ast.get("first"), Some(&Value::string("a")));
//! assert_eq!(ast.get("rest").and_then(|r| r.as_array()).map(|r| r.len()), Some(2));
//! ```
//!
//! ## JSON Grammars
//!
//! ```rust
//! use parsling::{GrammarSpec, Parser};
//!
//! let grammar = GrammarSpec::from_json(r#"{
//!     "ignore": "whitespace",
//!     "start": "assignment",
//!     "rules": {
//!         "whitespace": "/\\s+/",
//!         "assignment": [
//!             {"name": "target", "what": "/\\w+/"},
//!             "/=/",
//!             {"name": "value", "what": "/\\d+/"}
//!         ]
//!     }
//! }"#).unwrap();
//!
//! let ast = Parser::new(&grammar).unwrap().parse("x = 42").unwrap();
//! assert_eq!(ast.get("value").and_then(|v| v.as_str()), Some("42"));
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        if false {
            ::std::mem::drop(format!($($arg)*));
        }
    }};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        if false {
            ::std::mem::drop(format!($($arg)*));
        }
    }};
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

pub mod engine;

// Prelude module for convenient imports
pub mod prelude;

/// Grammar specifications and the builder DSL
pub use engine::grammar;

/// Re-export commonly used types for convenience
pub use engine::{
    // Callbacks
    CallbackContext,
    CallbackResult,
    // Errors
    ErrorHandler,
    GrammarError,
    ParseErrorKind,
    ParseException,
    // Grammar
    ComponentSpec,
    GrammarSpec,
    RuleSpec,
    // Parser
    ParseOptions,
    Parser,
    ParserOptions,
    State,
    // Source location
    SourcePosition,
    SourceSpan,
    // AST
    Value,
};
