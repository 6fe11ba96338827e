//! Packrat memoization for rule matches
//!
//! Each rule result is cached per start offset for the duration of one
//! parse pass. The whitespace mode is part of the key: a rule reached with
//! skipping disabled (as the ignore rule is) may match differently from
//! the same rule reached with skipping enabled.
//!
//! Failures are cached too, so every (rule, offset, mode) triple is
//! evaluated at most once per pass. The cache must be cleared whenever the
//! text changes, which [`MatchCache::clear`] does at the start of every
//! pass and after a reentrant parse.

use super::capture::Match;
use super::rule::RuleId;
use hashbrown::HashMap;

/// Cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    rule: RuleId,
    offset: usize,
    skip_ignored: bool,
}

impl CacheKey {
    /// Create a key
    #[inline]
    pub fn new(rule: RuleId, offset: usize, skip_ignored: bool) -> Self {
        Self {
            rule,
            offset,
            skip_ignored,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups answered from the cache
    pub hits: usize,
    /// Number of lookups that missed
    pub misses: usize,
    /// Number of stored results
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Per-pass rule match cache
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: HashMap<CacheKey, Option<Match>>,
    hits: usize,
    misses: usize,
}

impl MatchCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached result. `Some(None)` is a cached failure.
    #[inline]
    pub fn get(&mut self, key: &CacheKey) -> Option<&Option<Match>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(entry)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a result
    #[inline]
    pub fn insert(&mut self, key: CacheKey, result: Option<Match>) {
        self.entries.insert(key, result);
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}
