//! Top-level index system
//!
//! `IndexSystem` is the explicit instance callers construct (CLI main or
//! HTTP bootstrap) — there is no global singleton. It owns the current
//! immutable snapshot behind an `RwLock<Arc<_>>`: searches and reads clone
//! the `Arc` and run against a consistent snapshot, while `build_index`
//! assembles the replacement entirely off to the side and publishes it with
//! a single swap. A failed rebuild leaves the prior snapshot in effect.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Result;

use crate::cache::CacheManager;
use crate::indexer::Indexer;
use crate::models::{FileRecord, IndexConfig, IndexSnapshot, IndexStats, SearchResult};
use crate::query::{self, QueryCache, SearchOptions};
use crate::store;

pub struct IndexSystem {
    root: PathBuf,
    config: IndexConfig,
    cache: CacheManager,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    query_cache: QueryCache,
}

impl IndexSystem {
    /// Open the index system for a project root
    ///
    /// Loads the persisted snapshot if one exists; a missing or malformed
    /// store is logged and replaced by an empty snapshot, never an error.
    /// Teardown is the ordinary drop at end of scope.
    pub fn open(root: impl AsRef<Path>, config: IndexConfig) -> Self {
        let root = root.as_ref().to_path_buf();
        let cache = CacheManager::new(&root);

        let snapshot = if cache.exists() {
            match cache.load() {
                Ok(mut snapshot) => {
                    // The persisted copy carries the derived indices, but
                    // they are re-derived here so they can never disagree
                    // with the files map.
                    snapshot.tag_index = store::derive_tag_index(&snapshot.files);
                    snapshot.dependency_index = store::derive_dependency_index(&snapshot.files);
                    snapshot
                }
                Err(e) => {
                    log::warn!("Unusable persisted index ({:#}), starting empty", e);
                    IndexSnapshot::default()
                }
            }
        } else {
            log::info!("No persisted index found, starting empty");
            IndexSnapshot::default()
        };

        Self {
            root,
            config,
            cache,
            snapshot: RwLock::new(Arc::new(snapshot)),
            query_cache: QueryCache::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Grab the current snapshot; readers keep it consistent for as long as
    /// they hold the `Arc`, even across a concurrent rebuild
    fn current(&self) -> Arc<IndexSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Scan the project tree and rebuild the whole index
    ///
    /// The new snapshot replaces the old one atomically; the query cache is
    /// invalidated in full. A save failure after the swap is logged — the
    /// in-memory snapshot stays authoritative and the persisted copy lags.
    pub fn build_index(&self, show_progress: bool) -> Result<IndexStats> {
        let indexer = Indexer::new(self.config.clone());
        let records = indexer.index(&self.root, show_progress)?;
        let new_snapshot = Arc::new(store::build_snapshot(records));

        {
            let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
            *guard = Arc::clone(&new_snapshot);
        }
        self.query_cache.clear();

        if let Err(e) = self.cache.save(&new_snapshot) {
            log::warn!(
                "Failed to persist index ({:#}); in-memory snapshot remains authoritative",
                e
            );
        }

        Ok(new_snapshot.stats())
    }

    /// Execute a query, serving repeats from the cache
    pub fn search(&self, pattern: &str, options: &SearchOptions) -> Vec<SearchResult> {
        let options = options.clone().normalized();
        let snapshot = self.current();
        self.query_cache
            .get_or_compute(pattern, &options, || {
                query::search(&snapshot, pattern, &options)
            })
    }

    /// Look up one indexed file by its relative path
    pub fn file_record(&self, relative_path: &str) -> Option<FileRecord> {
        self.current().files.get(relative_path).cloned()
    }

    /// List files carrying the given tag
    pub fn files_by_tag(&self, tag: &str) -> Vec<String> {
        self.current()
            .tag_index
            .get(tag)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// List all tags with their file counts
    pub fn tags(&self) -> BTreeMap<String, usize> {
        self.current()
            .tag_index
            .iter()
            .map(|(tag, paths)| (tag.clone(), paths.len()))
            .collect()
    }

    /// List files inferred to depend on the given file
    pub fn dependents(&self, relative_path: &str) -> Vec<String> {
        self.current()
            .dependency_index
            .get(relative_path)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Statistics for the current snapshot
    pub fn stats(&self) -> IndexStats {
        self.current().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }

    #[test]
    fn test_open_without_store_starts_empty() {
        let temp = TempDir::new().unwrap();
        let system = IndexSystem::open(temp.path(), IndexConfig::default());
        assert_eq!(system.stats().total_files, 0);
        assert!(system.search("anything", &SearchOptions::default()).is_empty());
    }

    #[test]
    fn test_open_with_corrupt_store_starts_empty() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".fathom")).unwrap();
        std::fs::write(temp.path().join(".fathom/index.json"), "{broken").unwrap();

        let system = IndexSystem::open(temp.path(), IndexConfig::default());
        assert_eq!(system.stats().total_files, 0);
    }

    #[test]
    fn test_build_persists_and_reopens() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "src/app.js", "export function boot() {}\n");

        let system = IndexSystem::open(temp.path(), IndexConfig::default());
        let stats = system.build_index(false).unwrap();
        assert_eq!(stats.total_files, 1);

        drop(system);

        let reopened = IndexSystem::open(temp.path(), IndexConfig::default());
        assert_eq!(reopened.stats().total_files, 1);
        assert!(reopened.file_record("src/app.js").is_some());
    }

    #[test]
    fn test_rebuild_invalidates_query_cache() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "src/app.js", "function boot() {}\n");

        let system = IndexSystem::open(temp.path(), IndexConfig::default());
        system.build_index(false).unwrap();

        let before = system.search("boot", &SearchOptions::default());
        assert!(!before.is_empty());

        // New file appears; a cached result must not survive the rebuild
        write_file(temp.path(), "src/boot_helper.js", "function bootHelper() {}\n");
        system.build_index(false).unwrap();

        let after = system.search("boot", &SearchOptions::default());
        assert!(after.iter().any(|r| r.file == "src/boot_helper.js"));
    }

    #[test]
    fn test_dependents_end_to_end() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "src/a.js", "export function foo() {}\n");
        write_file(temp.path(), "src/b.js", "import {foo} from './a';\n");

        let system = IndexSystem::open(temp.path(), IndexConfig::default());
        system.build_index(false).unwrap();

        assert!(system
            .dependents("src/a.js")
            .contains(&"src/b.js".to_string()));
    }

    #[test]
    fn test_files_by_tag_and_tags_listing() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "src/auth/login.js", "function login() {}\n");

        let system = IndexSystem::open(temp.path(), IndexConfig::default());
        system.build_index(false).unwrap();

        assert_eq!(system.files_by_tag("auth"), vec!["src/auth/login.js"]);
        assert!(system.files_by_tag("missing").is_empty());
        assert_eq!(system.tags().get("auth"), Some(&1));
    }
}
