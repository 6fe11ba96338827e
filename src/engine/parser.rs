//! The parser entry point
//!
//! [`Parser`] owns a compiled grammar, the user context and the grammar's
//! state and error handler. Every call to [`Parser::parse`] runs one pass
//! over the text with fresh memo and furthest-match state.
//!
//! # Example
//!
//! ```rust
//! use parsling::grammar::*;
//! use parsling::{Parser, Value};
//!
//! let grammar = GrammarSpec::new("sum")
//!     .ignore("whitespace")
//!     .rule("whitespace", re(r"\s+"))
//!     .rule("number", re(r"\d+").named("value"))
//!     .rule(
//!         "sum",
//!         seq([
//!             rule_ref("number").named("left"),
//!             re(r"\+"),
//!             rule_ref("number").named("right"),
//!         ]),
//!     );
//!
//! let parser = Parser::new(&grammar).unwrap();
//! let ast = parser.parse("1 + 2").unwrap();
//! assert_eq!(ast.node_name(), Some("sum"));
//! assert_eq!(ast.get("left").and_then(|l| l.get("value")), Some(&Value::string("1")));
//! ```

use super::cache::CacheStats;
use super::callback::{ErrorHandler, State};
use super::capture::Cursor;
use super::compiler::{self, CompiledGrammar};
use super::error::{GrammarError, ParseErrorKind, ParseException};
use super::grammar::{GrammarSpec, RuleSpec};
use super::pass::{MatchOptions, Origin, Pass};
use super::value::Value;
use std::cell::{Cell, RefCell};
use std::fmt;

/// Default maximum rule nesting depth
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Default stack a parse may use before failing with a recursion error.
///
/// Half of the 2 MiB stack Rust gives spawned threads, which leaves room
/// for the frames of one more rule level and for the caller.
pub const DEFAULT_MAX_STACK_BYTES: usize = 1024 * 1024;

/// Options fixed when a parser is built
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Attach bounds to every map capture under the grammar's bounds name
    pub capture_all_bounds: bool,

    /// Rules replacing grammar rules of the same name, or adding new ones
    pub rules: Vec<(String, RuleSpec)>,

    /// Initial user context handed to callbacks
    pub context: Value,

    /// Maximum rule nesting depth (0 = unlimited)
    pub max_recursion_depth: usize,

    /// Maximum bytes of stack a parse may use, counted from the call to
    /// `parse` (0 = unlimited)
    pub max_stack_bytes: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            capture_all_bounds: false,
            rules: Vec::new(),
            context: Value::Nil,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_stack_bytes: DEFAULT_MAX_STACK_BYTES,
        }
    }
}

impl ParserOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach bounds to every map capture
    pub fn with_capture_all_bounds(mut self, enabled: bool) -> Self {
        self.capture_all_bounds = enabled;
        self
    }

    /// Add an override rule, replacing an earlier override of the same name
    pub fn with_rule(mut self, name: impl Into<String>, spec: impl Into<RuleSpec>) -> Self {
        let name = name.into();
        let spec = spec.into();
        match self.rules.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = spec,
            None => self.rules.push((name, spec)),
        }
        self
    }

    /// Set the initial user context
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Set the maximum rule nesting depth
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Set the stack budget of a parse. Raise it only when parsing on a
    /// thread with a larger stack than the default.
    pub fn with_max_stack_bytes(mut self, bytes: usize) -> Self {
        self.max_stack_bytes = bytes;
        self
    }

    pub(crate) fn overrides(&self, name: &str) -> bool {
        self.rules.iter().any(|(n, _)| n == name)
    }
}

/// Options for a single parse
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Whether terminals skip ignore-rule matches (default true)
    pub ignore_whitespace: Option<bool>,

    /// Rule to start from instead of the grammar's start rule
    pub start_rule: Option<String>,
}

impl ParseOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable whitespace skipping
    pub fn with_ignore_whitespace(mut self, enabled: bool) -> Self {
        self.ignore_whitespace = Some(enabled);
        self
    }

    /// Start from the named rule
    pub fn with_start_rule(mut self, name: impl Into<String>) -> Self {
        self.start_rule = Some(name.into());
        self
    }
}

/// The part of a parser callbacks can reach: the compiled grammar and the
/// limits that apply to every pass over it
#[derive(Debug)]
pub(crate) struct Engine {
    grammar: CompiledGrammar,
    max_recursion_depth: usize,
    max_stack_bytes: usize,
}

impl Engine {
    #[inline]
    pub(crate) fn grammar(&self) -> &CompiledGrammar {
        &self.grammar
    }

    #[inline]
    pub(crate) fn max_recursion_depth(&self) -> usize {
        self.max_recursion_depth
    }

    #[inline]
    pub(crate) fn max_stack_bytes(&self) -> usize {
        self.max_stack_bytes
    }

    /// Run one pass over `text`
    pub(crate) fn run(
        &self,
        text: &str,
        options: &ParseOptions,
        context: &mut Value,
        origin: Origin,
    ) -> Result<Value, ParseException> {
        self.run_with_stats(text, options, context, origin).0
    }

    fn run_with_stats(
        &self,
        text: &str,
        options: &ParseOptions,
        context: &mut Value,
        origin: Origin,
    ) -> (Result<Value, ParseException>, CacheStats) {
        let start = match &options.start_rule {
            Some(name) => match self.grammar.rule_id(name) {
                Some(id) => id,
                None => {
                    let error = ParseException::new(
                        ParseErrorKind::UnknownStartRule,
                        format!("No rule with name \"{}\" exists", name),
                        text,
                        None,
                        None,
                    );
                    return (Err(error), CacheStats::default());
                }
            },
            None => self.grammar.start(),
        };
        let opts = MatchOptions {
            ignore_whitespace: options.ignore_whitespace.unwrap_or(true),
        };

        log_debug!(
            "parsing {} bytes from rule \"{}\"",
            text.len(),
            self.grammar.rule(start).name()
        );

        let mut pass = Pass::new(self, text, context, origin);
        let result = match pass.match_rule(start, Cursor::START, opts) {
            Ok(Some(m)) => match pass.consume_ignored(m.end_cursor(Cursor::START)) {
                Ok(end) if end.offset == text.len() => Ok(m.components),
                Ok(_) => Err(pass.furthest_failure()),
                Err(e) => Err(e),
            },
            Ok(None) => Err(pass.furthest_failure()),
            Err(e) => Err(e),
        };

        let stats = pass.cache_stats();
        log_debug!(
            "parse {}: {} cache hits, {} misses",
            if result.is_ok() { "succeeded" } else { "failed" },
            stats.hits,
            stats.misses
        );
        (result, stats)
    }
}

/// A compiled grammar ready to parse
///
/// A parser can be reused for any number of texts. It is `Send` but not
/// `Sync`: a single parser runs one parse at a time.
pub struct Parser {
    engine: Engine,
    context: RefCell<Value>,
    state: Option<State>,
    error_handler: RefCell<Option<Box<dyn ErrorHandler>>>,
    last_stats: Cell<CacheStats>,
}

impl Parser {
    /// Compile `grammar` with default options
    pub fn new(grammar: &GrammarSpec) -> Result<Self, GrammarError> {
        Self::with_options(grammar, ParserOptions::default())
    }

    /// Compile `grammar` with `options`
    pub fn with_options(grammar: &GrammarSpec, options: ParserOptions) -> Result<Self, GrammarError> {
        let compiled = compiler::compile(grammar, &options)?;
        let state = grammar.state_factory().map(|f| f.create());
        let error_handler = grammar
            .error_handler_factory()
            .map(|f| f.create(state.clone()));

        Ok(Self {
            engine: Engine {
                grammar: compiled,
                max_recursion_depth: options.max_recursion_depth,
                max_stack_bytes: options.max_stack_bytes,
            },
            context: RefCell::new(options.context),
            state,
            error_handler: RefCell::new(error_handler),
            last_stats: Cell::new(CacheStats::default()),
        })
    }

    /// Parse `text` from the start rule
    pub fn parse(&self, text: &str) -> Result<Value, ParseException> {
        self.parse_with(text, &ParseOptions::default())
    }

    /// Parse `text` with per-call options.
    ///
    /// Non-fatal failures, including aborts raised by callbacks, go to the
    /// grammar's error handler when it has one.
    pub fn parse_with(&self, text: &str, options: &ParseOptions) -> Result<Value, ParseException> {
        let Ok(mut context) = self.context.try_borrow_mut() else {
            return Err(busy(text));
        };
        let (result, stats) = self.engine
            .run_with_stats(text, options, &mut context, Origin::here());
        drop(context);
        self.last_stats.set(stats);

        let error = match result {
            Ok(value) => return Ok(value),
            Err(error) if error.kind().is_fatal() => return Err(error),
            Err(error) => error,
        };
        let Ok(mut handler) = self.error_handler.try_borrow_mut() else {
            return Err(busy(text));
        };
        match handler.as_mut() {
            Some(handler) => handler.handle(error),
            None => Err(error),
        }
    }

    /// A copy of the user context
    pub fn context(&self) -> Value {
        self.context.borrow().clone()
    }

    /// Replace the user context
    pub fn set_context(&self, context: Value) {
        self.replace_context(context);
    }

    /// Replace the user context, returning the previous one
    pub fn replace_context(&self, context: Value) -> Value {
        self.context.replace(context)
    }

    /// The grammar's state, if the grammar defines one
    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    /// Whether the grammar installed an error handler
    pub fn has_error_handler(&self) -> bool {
        self.error_handler.borrow().is_some()
    }

    /// Names of every rule, including overrides and the `<BOF>`/`<EOF>`
    /// sentinels
    pub fn rule_names(&self) -> Vec<&str> {
        self.engine.grammar.rule_names()
    }

    /// Memo cache statistics of the most recent top-level parse
    pub fn cache_stats(&self) -> CacheStats {
        self.last_stats.get()
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("rules", &self.rule_names())
            .field("max_recursion_depth", &self.engine.max_recursion_depth)
            .field("max_stack_bytes", &self.engine.max_stack_bytes)
            .field("has_state", &self.state.is_some())
            .finish_non_exhaustive()
    }
}

fn busy(text: &str) -> ParseException {
    ParseException::new(
        ParseErrorKind::ParserBusy,
        "Parser is already parsing",
        text,
        None,
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grammar::*;

    fn number_grammar() -> GrammarSpec {
        GrammarSpec::new("number")
            .ignore("whitespace")
            .rule("whitespace", re(r"\s+"))
            .rule("number", re(r"\d+").named("value"))
    }

    #[test]
    fn test_parser_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Parser>();
    }

    #[test]
    fn test_options_builders() {
        let options = ParserOptions::new()
            .with_capture_all_bounds(true)
            .with_rule("a", re("x"))
            .with_rule("a", re("y"))
            .with_context(Value::int(1))
            .with_max_recursion_depth(10)
            .with_max_stack_bytes(4096);
        assert!(options.capture_all_bounds);
        assert_eq!(options.rules.len(), 1);
        assert!(options.overrides("a"));
        assert!(!options.overrides("b"));
        assert_eq!(options.context, Value::int(1));
        assert_eq!(options.max_recursion_depth, 10);
        assert_eq!(options.max_stack_bytes, 4096);
        assert_eq!(ParserOptions::new().max_stack_bytes, DEFAULT_MAX_STACK_BYTES);

        let parse = ParseOptions::new()
            .with_ignore_whitespace(false)
            .with_start_rule("x");
        assert_eq!(parse.ignore_whitespace, Some(false));
        assert_eq!(parse.start_rule.as_deref(), Some("x"));
    }

    #[test]
    fn test_trailing_ignored_input_is_consumed() {
        let parser = Parser::new(&number_grammar()).expect("compiles");
        let ast = parser.parse("  42 \n ").expect("parses");
        assert_eq!(ast.get("value"), Some(&Value::string("42")));
        assert_eq!(ast.node_name(), Some("number"));
    }

    #[test]
    fn test_unknown_start_rule_is_fatal() {
        let parser = Parser::new(&number_grammar()).expect("compiles");
        let error = parser
            .parse_with("1", &ParseOptions::new().with_start_rule("missing"))
            .expect_err("unknown rule");
        assert_eq!(error.kind(), ParseErrorKind::UnknownStartRule);
        assert!(error.kind().is_fatal());
    }

    #[test]
    fn test_alternate_start_rule() {
        let parser = Parser::new(&number_grammar()).expect("compiles");
        // With skipping on, the whitespace terminal would skip its own input
        let options = ParseOptions::new()
            .with_start_rule("whitespace")
            .with_ignore_whitespace(false);
        let ws = parser.parse_with("   ", &options).expect("parses");
        assert_eq!(ws, Value::string("   "));
    }

    #[test]
    fn test_context_round_trip() {
        let parser = Parser::with_options(
            &number_grammar(),
            ParserOptions::new().with_context(Value::string("ctx")),
        )
        .expect("compiles");
        assert_eq!(parser.context(), Value::string("ctx"));
        assert_eq!(parser.replace_context(Value::int(2)), Value::string("ctx"));
        parser.set_context(Value::Nil);
        assert!(parser.context().is_nil());
    }

    #[test]
    fn test_cache_stats_recorded() {
        let parser = Parser::new(&number_grammar()).expect("compiles");
        assert_eq!(parser.cache_stats(), CacheStats::default());
        parser.parse("7").expect("parses");
        assert!(parser.cache_stats().misses > 0);
    }

    #[test]
    fn test_alternatives_share_memoized_rule() {
        let grammar = GrammarSpec::new("pair")
            .rule("digit", re(r"\d"))
            .rule(
                "pair",
                one_of([
                    seq([rule_ref("digit"), re("x")]),
                    seq([rule_ref("digit"), re("y")]),
                ]),
            );
        let parser = Parser::new(&grammar).expect("compiles");

        parser.parse("1y").expect("parses");
        let stats = parser.cache_stats();
        assert_eq!(stats.hits, 1);
        assert!(stats.hit_rate() > 0.0);
    }
}
