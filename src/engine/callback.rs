//! Processor and modifier callbacks
//!
//! Rules may carry a *processor* and components a *modifier*: user code
//! that sees a capture right after it matched and decides what happens to
//! it. A callback returns:
//!
//! - `Ok(Some(value))` to replace the capture,
//! - `Ok(None)` to fail just this match (enclosing alternatives get to try),
//! - `Err(exception)` to abort the whole parse.
//!
//! The [`CallbackContext`] handed to a callback is the only way back into
//! the engine: it can parse another text with the same grammar, build abort
//! errors for the current match, and read or update the user context.

use super::error::{ParseErrorKind, ParseException};
use super::parser::{Engine, ParseOptions};
use super::pass::Origin;
use super::value::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// What a processor or modifier returns
pub type CallbackResult = Result<Option<Value>, ParseException>;

type CallbackFn = dyn Fn(Value, &mut CallbackContext<'_>) -> CallbackResult + Send + Sync;

/// A processor or modifier
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &mut CallbackContext<'_>) -> CallbackResult + Send + Sync + 'static,
    {
        Callback(Arc::new(f))
    }

    #[inline]
    pub(crate) fn call(&self, capture: Value, ctx: &mut CallbackContext<'_>) -> CallbackResult {
        (self.0)(capture, ctx)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// Capabilities available to a running callback
pub struct CallbackContext<'a> {
    engine: &'a Engine,
    text: &'a str,
    start: usize,
    end: usize,
    context: &'a mut Value,
    origin: Origin,
    reentered: bool,
}

impl<'a> CallbackContext<'a> {
    pub(crate) fn new(
        engine: &'a Engine,
        text: &'a str,
        start: usize,
        end: usize,
        context: &'a mut Value,
        origin: Origin,
    ) -> Self {
        Self {
            engine,
            text,
            start,
            end,
            context,
            origin,
            reentered: false,
        }
    }

    /// Parse `text` from the grammar's start rule.
    ///
    /// The nested parse has its own memo cache and furthest-match state,
    /// but shares the enclosing parse's recursion limits. Its failures are returned as-is; the grammar's error handler is not
    /// consulted. Propagating one with `?` aborts the outer parse.
    pub fn parse(&mut self, text: &str) -> Result<Value, ParseException> {
        self.parse_with(text, &ParseOptions::default())
    }

    /// Parse `text` with explicit options, e.g. an alternate start rule
    pub fn parse_with(
        &mut self,
        text: &str,
        options: &ParseOptions,
    ) -> Result<Value, ParseException> {
        log_debug!(
            "reentrant parse of {} bytes from {:?}",
            text.len(),
            options.start_rule
        );
        self.reentered = true;
        self.engine.run(text, options, &mut *self.context, self.origin)
    }

    /// Build an error that aborts the whole parse
    pub fn abort(&self, message: impl Into<String>) -> ParseException {
        ParseException::new(
            ParseErrorKind::Aborted,
            message,
            self.text,
            Some(self.start),
            Some(self.end),
        )
    }

    /// Build an aborting error carrying a context value
    pub fn abort_with(&self, message: impl Into<String>, context: Value) -> ParseException {
        self.abort(message).with_context(context)
    }

    /// Fail just this match
    pub fn fail(&self) -> CallbackResult {
        Ok(None)
    }

    /// The user context
    pub fn context(&self) -> &Value {
        &*self.context
    }

    /// The user context, mutably
    pub fn context_mut(&mut self) -> &mut Value {
        &mut *self.context
    }

    /// The whole input being parsed
    pub fn text(&self) -> &str {
        self.text
    }

    /// Start offset of the current match
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset of the current match
    pub fn end(&self) -> usize {
        self.end
    }

    /// The matched slice
    pub fn matched_text(&self) -> &str {
        self.text.get(self.start..self.end).unwrap_or("")
    }

    pub(crate) fn reentered(&self) -> bool {
        self.reentered
    }
}

/// Grammar-defined state shared with the error handler
pub type State = Arc<dyn Any + Send + Sync>;

/// Creates the grammar's [`State`] once per parser
#[derive(Clone)]
pub struct StateFactory(Arc<dyn Fn() -> State + Send + Sync>);

impl StateFactory {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> State + Send + Sync + 'static,
    {
        StateFactory(Arc::new(f))
    }

    pub(crate) fn create(&self) -> State {
        (self.0)()
    }
}

impl fmt::Debug for StateFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateFactory(..)")
    }
}

/// Receives every non-fatal parse failure of a top-level parse
///
/// Returning `Ok` substitutes a value for the failed parse; returning
/// `Err` reports the (possibly rewritten) error to the caller.
pub trait ErrorHandler: Send {
    /// Handle a failed parse
    fn handle(&mut self, error: ParseException) -> Result<Value, ParseException>;
}

impl<F> ErrorHandler for F
where
    F: FnMut(ParseException) -> Result<Value, ParseException> + Send,
{
    fn handle(&mut self, error: ParseException) -> Result<Value, ParseException> {
        (*self)(error)
    }
}

type HandlerFactoryFn = dyn Fn(Option<State>) -> Box<dyn ErrorHandler> + Send + Sync;

/// Creates the grammar's [`ErrorHandler`] once per parser, given its state
#[derive(Clone)]
pub struct ErrorHandlerFactory(Arc<HandlerFactoryFn>);

impl ErrorHandlerFactory {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<State>) -> Box<dyn ErrorHandler> + Send + Sync + 'static,
    {
        ErrorHandlerFactory(Arc::new(f))
    }

    pub(crate) fn create(&self, state: Option<State>) -> Box<dyn ErrorHandler> {
        (self.0)(state)
    }
}

impl fmt::Debug for ErrorHandlerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorHandlerFactory(..)")
    }
}
