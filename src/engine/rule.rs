//! Compiled rules
//!
//! A rule is a named, memoized entry point into the component graph. After
//! its root component matches, the rule post-processes the capture:
//! static options are merged in, the `ifNoMatch` fallback may collapse the
//! capture, the rule's name is stamped on and finally the processor runs.

use super::cache::CacheKey;
use super::callback::Callback;
use super::capture::{Cursor, Match};
use super::component::ComponentId;
use super::grammar::IfNoMatch;
use super::pass::{MatchOptions, MatchResult, Pass};
use super::value::Value;
use std::collections::BTreeMap;

/// Index of a rule in a compiled grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    /// The raw index
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct Rule {
    name: String,
    capture_name: Option<String>,
    if_no_match: Option<IfNoMatch>,
    processor: Option<Callback>,
    options: BTreeMap<String, Value>,
    component: ComponentId,
}

impl Rule {
    pub(crate) fn new(name: impl Into<String>, component: ComponentId) -> Self {
        Self {
            name: name.into(),
            capture_name: None,
            if_no_match: None,
            processor: None,
            options: BTreeMap::new(),
            component,
        }
    }

    pub(crate) fn with_capture_name(mut self, name: Option<String>) -> Self {
        self.capture_name = name;
        self
    }

    pub(crate) fn with_if_no_match(mut self, fallback: Option<IfNoMatch>) -> Self {
        self.if_no_match = fallback;
        self
    }

    pub(crate) fn with_processor(mut self, processor: Option<Callback>) -> Self {
        self.processor = processor;
        self
    }

    pub(crate) fn with_options(mut self, options: BTreeMap<String, Value>) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub(crate) fn component_id(&self) -> ComponentId {
        self.component
    }

    /// Memoized match at `at`
    pub(crate) fn apply(
        &self,
        id: RuleId,
        pass: &mut Pass<'_>,
        at: Cursor,
        opts: MatchOptions,
    ) -> MatchResult {
        let key = CacheKey::new(id, at.offset, opts.ignore_whitespace);
        if let Some(cached) = pass.cache().get(&key) {
            log_trace!("cache hit for rule {} at {}", self.name, at.offset);
            return Ok(cached.clone());
        }

        let result = self.evaluate(pass, at, opts)?;
        pass.cache().insert(key, result.clone());
        Ok(result)
    }

    fn evaluate(&self, pass: &mut Pass<'_>, at: Cursor, opts: MatchOptions) -> MatchResult {
        let Some(mut m) = pass.match_component(self.component, at, opts)? else {
            return Ok(None);
        };

        if let Value::Hash(map) = &mut m.components {
            for (key, value) in &self.options {
                map.insert(key.clone(), value.clone());
            }
        }

        if !self.apply_fallback(&mut m) {
            if let Value::Hash(map) = &mut m.components {
                // An inner rule forming the whole body keeps its identity
                map.entry("name".to_string()).or_insert_with(|| {
                    Value::string(self.capture_name.as_deref().unwrap_or(&self.name))
                });
            }
        }

        match &self.processor {
            Some(processor) => self.process(processor, pass, at, m),
            None => Ok(Some(m)),
        }
    }

    /// Swap in the fallback capture when the tested child is missing or
    /// blank. Returns whether it did.
    fn apply_fallback(&self, m: &mut Match) -> bool {
        let Some(fallback) = &self.if_no_match else {
            return false;
        };
        let Value::Hash(map) = &mut m.components else {
            return false;
        };
        if map.get(&fallback.component).is_some_and(|v| !v.is_blank()) {
            return false;
        }
        m.components = map.remove(&fallback.capture).unwrap_or(Value::Nil);
        true
    }

    fn process(
        &self,
        processor: &Callback,
        pass: &mut Pass<'_>,
        at: Cursor,
        mut m: Match,
    ) -> MatchResult {
        let grammar = pass.grammar();
        let bounds_name = grammar.component(self.component).bounds_name();
        let held = bounds_name.and_then(|name| m.components.get(name).cloned());

        let capture = std::mem::take(&mut m.components);
        let Some(mut processed) = pass.invoke(processor, capture, m.start(at), m.end(at))? else {
            return Ok(None);
        };

        if let (Some(name), Some(bounds), Value::Hash(map)) = (bounds_name, held, &mut processed) {
            map.entry(name.to_string()).or_insert(bounds);
        }
        m.components = processed;
        Ok(Some(m))
    }
}
