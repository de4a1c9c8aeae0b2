//! Core data models for Fathom
//!
//! These structures represent the indexed form of a project tree and the
//! normalized result format returned to CLI and HTTP consumers.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Logical grouping of file extensions sharing extraction rules
///
/// Each category carries its own comment/string heuristics and keyword
/// vocabulary (see `rules.rs`). The category set is fixed at compile time;
/// extension mapping is a pure function of the (lowercased) extension.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Category {
    Script,
    Markup,
    Stylesheet,
    StructuredData,
    Documentation,
    Unknown,
}

impl Category {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "mts" | "cts" => Category::Script,
            "html" | "htm" | "xhtml" | "xml" | "svg" => Category::Markup,
            "css" | "scss" | "sass" | "less" => Category::Stylesheet,
            "json" | "yaml" | "yml" | "toml" => Category::StructuredData,
            "md" | "markdown" | "txt" | "rst" => Category::Documentation,
            _ => Category::Unknown,
        }
    }

    /// Check if this category is claimed by the classifier
    ///
    /// Only recognized files are picked up by the scanner. Unknown files can
    /// still be indexed explicitly; they get reduced extraction (no symbols,
    /// no keywords).
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Category::Unknown)
    }

    /// Whether content of this category is script-like and eligible for
    /// symbol/import/export extraction
    pub fn is_script_like(&self) -> bool {
        matches!(self, Category::Script)
    }
}

/// Kind of match that produced a search hit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MatchKind {
    Filename,
    Symbol,
    Keyword,
    Content,
}

/// The indexed representation of one file
///
/// Keyed by `relative_path` within a snapshot; re-indexing the same relative
/// path replaces the prior record. `content_hash` is a pure function of
/// `content` and drives change detection and dependency matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Absolute path on disk
    pub absolute_path: String,
    /// Path relative to the indexed root, `/`-separated (unique key)
    pub relative_path: String,
    /// File stem, without extension
    pub name: String,
    /// Lowercased extension, without the leading dot
    pub extension: String,
    /// File size in bytes (from the filesystem)
    pub size_bytes: u64,
    /// Last modification time, epoch milliseconds
    pub last_modified_epoch_ms: i64,
    /// Logical file category
    pub category: Category,
    /// Full text, retained to support content search
    pub content: String,
    /// Count of `\n`-delimited segments
    pub line_count: usize,
    /// Symbol names found by the extraction patterns, in match order.
    /// Duplicates are preserved: repeat occurrences matter for relevance.
    pub declared_symbols: Vec<String>,
    /// Raw import specifiers as they appear in source
    pub import_refs: Vec<String>,
    /// Raw export references as they appear in source
    pub export_refs: Vec<String>,
    /// Category-vocabulary keywords present in the content
    pub keyword_hits: BTreeSet<String>,
    /// Derived tags (path segments, category, content signals)
    pub tags: BTreeSet<String>,
    /// Deterministic blake3 hex digest of `content`
    pub content_hash: String,
}

/// A single ranked search hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Relative path of the matching file
    pub file: String,
    /// 1-indexed line number (content matches only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// The matching text: file name, symbol, keyword, or line content
    pub content: String,
    pub match_kind: MatchKind,
    /// Cumulative per-file relevance at the time this hit was emitted
    pub relevance: u32,
}

/// One immutable snapshot of the index
///
/// `tag_index` and `dependency_index` are derived from `files` on every
/// build and are never mutated independently, so they cannot disagree with
/// the files map. Snapshots are published wholesale by an atomic swap; no
/// partial-mutation API exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    /// relative path → record
    pub files: BTreeMap<String, FileRecord>,
    /// tag → ordered set of relative paths
    #[serde(rename = "tags")]
    pub tag_index: BTreeMap<String, BTreeSet<String>>,
    /// relative path → ordered set of dependent relative paths
    #[serde(rename = "dependencies")]
    pub dependency_index: BTreeMap<String, BTreeSet<String>>,
    pub total_files: usize,
    #[serde(rename = "totalSize")]
    pub total_size_bytes: u64,
    #[serde(rename = "lastUpdated")]
    pub last_updated_epoch_ms: i64,
}

/// Statistics about the current index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub last_updated_epoch_ms: i64,
    /// File count breakdown by category
    pub files_by_category: HashMap<String, usize>,
    /// Line count breakdown by category
    pub lines_by_category: HashMap<String, usize>,
}

/// Configuration for indexing behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory names pruned entirely during the scan
    pub excluded_dirs: Vec<String>,
    /// Maximum file size to index (bytes)
    pub max_file_size: u64,
    /// Number of threads for parallel indexing (0 = auto, 80% of available cores)
    pub parallel_threads: usize,
    /// Follow symbolic links
    pub follow_symlinks: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: [
                // The engine's own store must never be indexed into itself
                crate::cache::CACHE_DIR,
                "node_modules",
                "vendor",
                ".cache",
                "dist",
                "build",
                "out",
                "target",
                ".git",
                ".svn",
                ".hg",
                "coverage",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_file_size: 10 * 1024 * 1024, // 10 MB
            parallel_threads: 0,             // 0 = auto (80% of available cores)
            follow_symlinks: false,
        }
    }
}

impl IndexSnapshot {
    /// Compute display statistics for this snapshot
    pub fn stats(&self) -> IndexStats {
        let mut files_by_category: HashMap<String, usize> = HashMap::new();
        let mut lines_by_category: HashMap<String, usize> = HashMap::new();

        for record in self.files.values() {
            let key = record.category.to_string();
            *files_by_category.entry(key.clone()).or_insert(0) += 1;
            *lines_by_category.entry(key).or_insert(0) += record.line_count;
        }

        IndexStats {
            total_files: self.total_files,
            total_size_bytes: self.total_size_bytes,
            last_updated_epoch_ms: self.last_updated_epoch_ms,
            files_by_category,
            lines_by_category,
        }
    }
}
