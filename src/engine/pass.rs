//! State of one parse pass
//!
//! A [`Pass`] is created for every top-level or reentrant parse and owns
//! everything that is only valid for one text: the memo cache, the two
//! furthest-match trackers and the recursion counter. The compiled grammar
//! and the user context are borrowed.
//!
//! Matching recurses on the native stack, so a pass is bounded twice: by
//! rule nesting depth and by the bytes of stack used since the outermost
//! parse started. Reentrant passes inherit both from the pass whose
//! callback started them.

use super::cache::{CacheStats, MatchCache};
use super::callback::{Callback, CallbackContext, CallbackResult};
use super::capture::{Cursor, Match};
use super::compiler::CompiledGrammar;
use super::component::ComponentId;
use super::error::{ParseErrorKind, ParseException};
use super::parser::Engine;
use super::rule::RuleId;
use super::value::Value;

/// Result of matching a rule or component. `Ok(None)` is an ordinary
/// mismatch, `Err` aborts the pass.
pub type MatchResult = Result<Option<Match>, ParseException>;

/// Options cascaded down the matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Whether terminals skip the ignore rule's matches first
    pub ignore_whitespace: bool,
}

impl MatchOptions {
    /// Skipping disabled, as used when matching the ignore rule itself
    pub const RAW: MatchOptions = MatchOptions {
        ignore_whitespace: false,
    };
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            ignore_whitespace: true,
        }
    }
}

/// The furthest successful match seen by one tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Furthest {
    pub(crate) offset: usize,
    pub(crate) length: usize,
}

impl Furthest {
    #[inline]
    pub(crate) fn end(&self) -> usize {
        self.offset + self.length
    }

    fn record(slot: &mut Option<Furthest>, offset: usize, length: usize) {
        if length == 0 {
            return;
        }
        if slot.map_or(true, |best| offset >= best.offset) {
            *slot = Some(Furthest { offset, length });
        }
    }
}

/// Approximate address of the current stack frame
#[inline(never)]
fn stack_address() -> usize {
    let marker = 0u8;
    std::hint::black_box(&marker) as *const u8 as usize
}

/// Where a pass's recursion budget is counted from
#[derive(Debug, Clone, Copy)]
pub(crate) struct Origin {
    stack: usize,
    depth: usize,
}

impl Origin {
    /// A fresh budget starting at the caller's frame
    pub(crate) fn here() -> Self {
        Self {
            stack: stack_address(),
            depth: 0,
        }
    }
}

pub(crate) struct Pass<'a> {
    engine: &'a Engine,
    origin: Origin,
    text: &'a str,
    context: &'a mut Value,
    cache: MatchCache,
    furthest: Option<Furthest>,
    furthest_ignored: Option<Furthest>,
    depth: usize,
    skipping: bool,
}

impl<'a> Pass<'a> {
    pub(crate) fn new(
        engine: &'a Engine,
        text: &'a str,
        context: &'a mut Value,
        origin: Origin,
    ) -> Self {
        Self {
            engine,
            origin,
            text,
            context,
            cache: MatchCache::new(),
            furthest: None,
            furthest_ignored: None,
            depth: origin.depth,
            skipping: false,
        }
    }

    #[inline]
    pub(crate) fn text(&self) -> &'a str {
        self.text
    }

    #[inline]
    pub(crate) fn grammar(&self) -> &'a CompiledGrammar {
        self.engine.grammar()
    }

    #[inline]
    pub(crate) fn cache(&mut self) -> &mut MatchCache {
        &mut self.cache
    }

    pub(crate) fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub(crate) fn match_rule(&mut self, id: RuleId, at: Cursor, opts: MatchOptions) -> MatchResult {
        let limit = self.engine.max_recursion_depth();
        if limit > 0 && self.depth >= limit {
            log_debug!("recursion limit {} hit at offset {}", limit, at.offset);
            return Err(ParseException::new(
                ParseErrorKind::RecursionLimit,
                format!(
                    "Recursion limit of {} exceeded in rule \"{}\"",
                    limit,
                    self.grammar().rule(id).name()
                ),
                self.text,
                Some(at.offset),
                Some(at.offset),
            ));
        }
        let budget = self.engine.max_stack_bytes();
        if budget > 0 && stack_address().abs_diff(self.origin.stack) > budget {
            log_debug!("stack budget {} hit at offset {}", budget, at.offset);
            return Err(ParseException::new(
                ParseErrorKind::RecursionLimit,
                format!(
                    "Recursion limit exceeded in rule \"{}\": more than {} bytes of stack used",
                    self.grammar().rule(id).name(),
                    budget
                ),
                self.text,
                Some(at.offset),
                Some(at.offset),
            ));
        }

        self.depth += 1;
        let grammar = self.grammar();
        let result = grammar.rule(id).apply(id, self, at, opts);
        self.depth -= 1;
        result
    }

    #[inline]
    pub(crate) fn match_component(
        &mut self,
        id: ComponentId,
        at: Cursor,
        opts: MatchOptions,
    ) -> MatchResult {
        let grammar = self.grammar();
        grammar.component(id).apply(self, at, opts)
    }

    /// Skip the ignore rule's matches starting at `at`.
    ///
    /// Does nothing when skipping is disabled or while the ignore rule is
    /// itself being matched.
    pub(crate) fn skip_ignored(
        &mut self,
        at: Cursor,
        opts: MatchOptions,
    ) -> Result<Cursor, ParseException> {
        if !opts.ignore_whitespace || self.skipping {
            return Ok(at);
        }
        self.consume_ignored(at)
    }

    /// Repeatedly match the ignore rule with skipping disabled
    pub(crate) fn consume_ignored(&mut self, mut at: Cursor) -> Result<Cursor, ParseException> {
        let Some(ignore) = self.grammar().ignore() else {
            return Ok(at);
        };

        let outer = std::mem::replace(&mut self.skipping, true);
        let result = loop {
            match self.match_rule(ignore, at, MatchOptions::RAW) {
                Ok(Some(m)) if m.consumed() > 0 => at = m.end_cursor(at),
                Ok(_) => break Ok(at),
                Err(e) => break Err(e),
            }
        };
        self.skipping = outer;
        result
    }

    /// Record a successful match with the matching tracker
    pub(crate) fn log_match(&mut self, m: &Match, at: Cursor, ignored: bool) {
        let slot = if ignored {
            &mut self.furthest_ignored
        } else {
            &mut self.furthest
        };
        Furthest::record(slot, m.start(at), m.text_length);
    }

    /// Run a processor or modifier over the match spanning `start..end`.
    ///
    /// A reentrant parse inside the callback invalidates this pass's memo
    /// cache, so it is cleared before matching resumes.
    pub(crate) fn invoke(
        &mut self,
        callback: &Callback,
        capture: Value,
        start: usize,
        end: usize,
    ) -> CallbackResult {
        let origin = Origin {
            stack: self.origin.stack,
            depth: self.depth,
        };
        let mut ctx =
            CallbackContext::new(self.engine, self.text, start, end, &mut *self.context, origin);
        let result = callback.call(capture, &mut ctx);
        if ctx.reentered() {
            self.cache.clear();
        }
        if let Err(ref e) = result {
            log_debug!("callback aborted parse: {}", e.message());
        }
        result
    }

    /// Build the error for a failed or partial parse from the trackers.
    ///
    /// The start is where the furthest content match began. The end prefers
    /// the ignore tracker when it got further than the content tracker.
    pub(crate) fn furthest_failure(&self) -> ParseException {
        let end = match (self.furthest, self.furthest_ignored) {
            (Some(content), Some(ignored)) if ignored.offset > content.offset => Some(ignored.end()),
            (Some(content), _) => Some(content.end()),
            (None, ignored) => ignored.map(|i| i.end()),
        };
        let start = self.furthest.or(self.furthest_ignored).map(|f| f.offset);

        let (kind, message) = match end {
            None => (ParseErrorKind::NoMatch, "No match".to_string()),
            Some(end) => match self.text.get(end..).and_then(|rest| rest.chars().next()) {
                Some(c) => (
                    ParseErrorKind::Unexpected,
                    format!("Unexpected \"{}\"", c.escape_default()),
                ),
                None => (
                    ParseErrorKind::UnexpectedEndOfInput,
                    "Unexpected end of input".to_string(),
                ),
            },
        };
        log_debug!(
            "parse failed: {} (content {:?}, ignored {:?})",
            message,
            self.furthest,
            self.furthest_ignored
        );
        ParseException::new(kind, message, self.text, start, end)
    }
}
