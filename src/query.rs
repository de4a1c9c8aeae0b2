//! Query execution and result caching
//!
//! Search runs against one immutable `IndexSnapshot` and never mutates it.
//! Hits accumulate a per-file running relevance total: every hit records the
//! accumulator value at the moment it is emitted, so later hits on the same
//! file carry the already-incremented score. Results sort descending on that
//! recorded value with stable tie order, then truncate to `max_results`.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::models::{Category, IndexSnapshot, MatchKind, SearchResult};
use crate::rules;

/// Result cap applied when the caller gives none (or a malformed value)
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Relevance weights per match kind
const FILENAME_WEIGHT: u32 = 10;
const SYMBOL_WEIGHT: u32 = 8;
const KEYWORD_WEIGHT: u32 = 5;
const CONTENT_WEIGHT: u32 = 3;

/// Search options
///
/// Serialization of this struct is deterministic (fixed field order), which
/// is what makes it usable as part of a cache key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Restrict results to one category
    pub category: Option<Category>,
    /// Require at least one overlapping tag
    pub tags: Option<Vec<String>>,
    /// Include per-line content matches
    pub include_content: bool,
    /// Cap on the ranked result list
    pub max_results: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            category: None,
            tags: None,
            include_content: true,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchOptions {
    /// Normalize malformed values to safe defaults instead of raising
    pub fn normalized(mut self) -> Self {
        if self.max_results == 0 {
            self.max_results = DEFAULT_MAX_RESULTS;
        }
        if self.tags.as_ref().is_some_and(|t| t.is_empty()) {
            self.tags = None;
        }
        self
    }
}

/// Execute a query against a snapshot
///
/// Never errors: an empty snapshot yields an empty list. Options are
/// normalized before use.
pub fn search(snapshot: &IndexSnapshot, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
    let options = options.clone().normalized();
    let needle = query.to_lowercase();
    let mut hits: Vec<SearchResult> = Vec::new();

    for record in snapshot.files.values() {
        if let Some(category) = options.category {
            if record.category != category {
                continue;
            }
        }
        if let Some(tags) = &options.tags {
            if !tags.iter().any(|t| record.tags.contains(t)) {
                continue;
            }
        }

        // Per-file running total; each hit records the value at emission time
        let mut relevance: u32 = 0;

        if record.name.to_lowercase().contains(&needle) {
            relevance += FILENAME_WEIGHT;
            hits.push(SearchResult {
                file: record.relative_path.clone(),
                line: None,
                content: record.name.clone(),
                match_kind: MatchKind::Filename,
                relevance,
            });
        }

        for symbol in &record.declared_symbols {
            if symbol.to_lowercase().contains(&needle) {
                relevance += SYMBOL_WEIGHT;
                hits.push(SearchResult {
                    file: record.relative_path.clone(),
                    line: None,
                    content: symbol.clone(),
                    match_kind: MatchKind::Symbol,
                    relevance,
                });
            }
        }

        for keyword in &record.keyword_hits {
            if keyword.contains(&needle) {
                relevance += KEYWORD_WEIGHT;
                hits.push(SearchResult {
                    file: record.relative_path.clone(),
                    line: None,
                    content: keyword.clone(),
                    match_kind: MatchKind::Keyword,
                    relevance,
                });
            }
        }

        if options.include_content {
            let line_rules = record.category.rules();
            for (idx, line) in record.content.split('\n').enumerate() {
                if !line.to_lowercase().contains(&needle) {
                    continue;
                }
                if rules::line_is_excluded(line, line_rules) {
                    continue;
                }
                relevance += CONTENT_WEIGHT;
                hits.push(SearchResult {
                    file: record.relative_path.clone(),
                    line: Some(idx + 1),
                    content: line.trim().to_string(),
                    match_kind: MatchKind::Content,
                    relevance,
                });
            }
        }
    }

    // Stable sort keeps emission order for equal scores
    hits.sort_by(|a, b| b.relevance.cmp(&a.relevance));
    hits.truncate(options.max_results);
    hits
}

/// Memoizes search results until the next rebuild
///
/// Keyed by the query string plus the serialized normalized options; two
/// calls whose options serialize identically share one entry. Invalidated
/// in full (never per-key) by `clear`, which runs after every successful
/// rebuild. Entries have no TTL.
#[derive(Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, Vec<SearchResult>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(query: &str, options: &SearchOptions) -> String {
        let options_json = serde_json::to_string(options).unwrap_or_default();
        format!("{}|{}", query, options_json)
    }

    /// Return the cached result list, computing and storing it on a miss
    pub fn get_or_compute<F>(
        &self,
        query: &str,
        options: &SearchOptions,
        compute: F,
    ) -> Vec<SearchResult>
    where
        F: FnOnce() -> Vec<SearchResult>,
    {
        let key = Self::key(query, options);

        {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = entries.get(&key) {
                log::debug!("Query cache hit: {}", key);
                return cached.clone();
            }
        }

        let results = compute();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, results.clone());
        results
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let dropped = entries.len();
        entries.clear();
        if dropped > 0 {
            log::debug!("Cleared {} cached query results", dropped);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
