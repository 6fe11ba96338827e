//! Thread-local regex cache for grammar compilation
//!
//! Grammars tend to repeat the same terminals (`\s+`, `\w+`, ...) and the
//! same grammar is often compiled into several parsers, so compiled
//! patterns are shared per thread. `Regex` clones are cheap.

use super::error::GrammarError;
use hashbrown::HashMap;
use regex::Regex;
use std::cell::RefCell;

thread_local! {
    static REGEX_CACHE: RefCell<HashMap<String, Regex>> = RefCell::new(HashMap::new());
}

/// Compile `pattern` so it only matches at the start of the haystack.
///
/// The pattern is wrapped as `^(?:pattern)`; terminals slice the input at
/// the current offset, so this anchors them there instead of letting them
/// scan forward.
pub fn compile_anchored(pattern: &str) -> Result<Regex, GrammarError> {
    compile_as(pattern, format!("^(?:{})", pattern))
}

/// Compile `pattern` as written
pub fn compile(pattern: &str) -> Result<Regex, GrammarError> {
    compile_as(pattern, pattern.to_string())
}

fn compile_as(original: &str, source: String) -> Result<Regex, GrammarError> {
    REGEX_CACHE.with(|cache| {
        if let Some(regex) = cache.borrow().get(&source) {
            return Ok(regex.clone());
        }

        let regex = Regex::new(&source).map_err(|e| GrammarError::InvalidRegex {
            pattern: original.to_string(),
            message: e.to_string(),
        })?;
        cache.borrow_mut().insert(source, regex.clone());
        Ok(regex)
    })
}

/// Clear the regex cache
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Get the number of cached patterns
pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}
