//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions from
//! parsling. Importing it with a wildcard brings everything needed to write
//! and run a grammar into scope:
//!
//! ```
//! use parsling::prelude::*;
//!
//! let grammar = GrammarSpec::new("greeting").rule("greeting", lit("hello"));
//! let parser = Parser::new(&grammar).unwrap();
//! assert_eq!(parser.parse("hello").unwrap(), Value::string("hello"));
//! ```
//!
//! # Re-exported Items
//!
//! ## Core Types
//! - [`Parser`] - Compiled grammar ready to parse
//! - [`ParserOptions`] - Construction options
//! - [`ParseOptions`] - Per-parse options
//! - [`Value`] - AST value
//!
//! ## Grammar DSL
//! - [`GrammarSpec`], [`RuleSpec`], [`ComponentSpec`]
//! - [`re()`], [`lit()`], [`rule_ref()`], [`text_ref()`], [`seq()`]
//! - [`all_of()`], [`one_of()`], [`one_or_more_of()`], [`zero_or_more_of()`],
//!   [`optionally()`], [`rule()`], [`what()`]
//!
//! ## Error Handling
//! - [`ParseException`] - Failed parse
//! - [`ParseErrorKind`] - Failure category
//! - [`GrammarError`] - Malformed grammar
//!
//! ## Callbacks
//! - [`CallbackContext`] - Capabilities of a running callback
//! - [`CallbackResult`] - Callback return type
//! - [`ErrorHandler`] - Grammar-level failure handler

// ============================================================================
// Core Types
// ============================================================================

pub use crate::engine::{ParseOptions, Parser, ParserOptions, Value};

// ============================================================================
// Grammar DSL
// ============================================================================

pub use crate::engine::grammar::{
    all_of, lit, one_of, one_or_more_of, optionally, re, rule, rule_ref, seq, text_ref, what,
    zero_or_more_of, ComponentSpec, GrammarSpec, RuleSpec,
};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::engine::{GrammarError, ParseErrorKind, ParseException};

// ============================================================================
// Callbacks
// ============================================================================

pub use crate::engine::{CallbackContext, CallbackResult, ErrorHandler, State};
