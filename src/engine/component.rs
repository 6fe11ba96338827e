//! Compiled components
//!
//! A component applies one qualifier and packages the result: it cascades
//! the whitespace mode, reports the match to the furthest-match trackers,
//! runs the modifier, then names or merges the capture and attaches
//! bounds.

use super::callback::Callback;
use super::capture::{merge_sequence, wrap_named, Cursor};
use super::pass::{MatchOptions, MatchResult, Pass};
use super::qualifier::{self, Qualifier};
use super::value::Value;
use regex::Regex;

/// Index of a component in a compiled grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) usize);

/// A compiled string replacement
#[derive(Debug, Clone)]
pub(crate) struct Replacement {
    pub(crate) pattern: Regex,
    pub(crate) replacement: String,
    pub(crate) global: bool,
}

impl Replacement {
    fn apply(&self, text: &str) -> String {
        if self.global {
            self.pattern
                .replace_all(text, self.replacement.as_str())
                .into_owned()
        } else {
            self.pattern
                .replace(text, self.replacement.as_str())
                .into_owned()
        }
    }
}

#[derive(Debug)]
pub(crate) struct Component {
    pub(crate) qualifier: Qualifier,
    pub(crate) name: Option<String>,
    pub(crate) allow_merge: bool,
    pub(crate) ignore_whitespace: Option<bool>,
    pub(crate) wrap_in_array: bool,
    pub(crate) capture_index: usize,
    pub(crate) replace: Vec<Replacement>,
    pub(crate) modifier: Option<Callback>,
    pub(crate) text: Option<String>,
    pub(crate) bounds_name: Option<String>,
    /// Set by an explicit `captureBoundsAs`, which always captures a map
    pub(crate) own_bounds: bool,
}

impl Component {
    /// A component with default arguments
    pub(crate) fn new(qualifier: Qualifier) -> Self {
        Self {
            qualifier,
            name: None,
            allow_merge: true,
            ignore_whitespace: None,
            wrap_in_array: false,
            capture_index: 0,
            replace: Vec::new(),
            modifier: None,
            text: None,
            bounds_name: None,
            own_bounds: false,
        }
    }

    pub(crate) fn bounds_name(&self) -> Option<&str> {
        self.bounds_name.as_deref()
    }

    /// Run the replacements over a string
    pub(crate) fn apply_replacements(&self, text: String) -> String {
        self.replace
            .iter()
            .fold(text, |acc, replacement| replacement.apply(&acc))
    }

    pub(crate) fn apply(&self, pass: &mut Pass<'_>, at: Cursor, opts: MatchOptions) -> MatchResult {
        let opts = match self.ignore_whitespace {
            Some(ignore_whitespace) => MatchOptions { ignore_whitespace },
            None => opts,
        };

        let Some(mut sub) = qualifier::apply(self, pass, at, opts)? else {
            return Ok(None);
        };
        pass.log_match(&sub, at, !opts.ignore_whitespace);

        let mut capture = std::mem::take(&mut sub.components);
        if let Some(modifier) = &self.modifier {
            match pass.invoke(modifier, capture, sub.start(at), sub.end(at))? {
                Some(modified) => capture = modified,
                None => return Ok(None),
            }
        }

        let mut capture = if self.name.is_some() || !self.allow_merge || self.own_bounds {
            wrap_named(self.name.as_deref(), capture)
        } else {
            match capture {
                Value::Array(items) => merge_sequence(items),
                other => other,
            }
        };

        if let (Some(bounds), Value::Hash(map)) = (&self.bounds_name, &mut capture) {
            let span = sub.span(pass.text(), at);
            map.insert(bounds.clone(), span.to_value());
        }

        sub.components = capture;
        Ok(Some(sub))
    }
}
