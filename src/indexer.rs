//! Indexing engine for scanning and recording project files
//!
//! The indexer walks the project tree, classifies each candidate file by
//! extension, extracts structural facts and tags, and produces one
//! `FileRecord` per readable file. Records are independent of each other, so
//! per-file work runs on a bounded rayon thread pool.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;

use crate::extract;
use crate::models::{Category, FileRecord, IndexConfig};
use crate::tagger;

/// Manages the scanning and per-file indexing process
pub struct Indexer {
    config: IndexConfig,
}

impl Indexer {
    /// Create a new indexer with the given config
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Scan the tree and index every candidate file
    ///
    /// Files that fail to stat or read are logged and skipped; the build
    /// continues with the rest. Never fails as a whole once the root itself
    /// is walkable.
    pub fn index(&self, root: impl AsRef<Path>, show_progress: bool) -> Result<Vec<FileRecord>> {
        let root = root.as_ref();
        log::info!("Indexing directory: {:?}", root);

        let files = self.scan(root)?;
        let total_files = files.len();
        log::info!("Discovered {} files to index", total_files);

        // 0 = auto (use 80% of available cores to avoid locking the system)
        let num_threads = if self.config.parallel_threads == 0 {
            let available_cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4);
            ((available_cores as f64 * 0.8).ceil() as usize).max(1)
        } else {
            self.config.parallel_threads
        };
        log::info!("Using {} threads for parallel indexing", num_threads);

        let pb = if show_progress {
            let pb = ProgressBar::new(total_files as u64);
            pb.set_draw_target(ProgressDrawTarget::stderr());
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%)")
                    .expect("static progress template")
                    .progress_chars("=>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .context("Failed to create thread pool")?;

        let records: Vec<FileRecord> = pool.install(|| {
            files
                .par_iter()
                .filter_map(|path| {
                    let record = match self.index_file(root, path) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            log::warn!("Skipping {}: {:#}", path.display(), e);
                            None
                        }
                    };
                    pb.inc(1);
                    record
                })
                .collect()
        });

        pb.finish_and_clear();
        log::info!("Indexed {} of {} discovered files", records.len(), total_files);

        Ok(records)
    }

    /// Discover all candidate files in the directory tree
    ///
    /// Excluded directory names are pruned entirely (never descended into);
    /// unreadable subtrees are logged and skipped. Order is
    /// filesystem-dependent and not guaranteed stable across platforms.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let excluded: HashSet<String> = self.config.excluded_dirs.iter().cloned().collect();
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(self.config.follow_symlinks)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                if is_dir {
                    let name = entry.file_name().to_string_lossy();
                    if excluded.contains(name.as_ref()) {
                        log::debug!("Pruning excluded directory: {}", entry.path().display());
                        return false;
                    }
                }
                true
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            if self.should_index(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }

        Ok(files)
    }

    /// Check if a file should be indexed based on extension and size
    fn should_index(&self, path: &Path) -> bool {
        let ext = match path.extension() {
            Some(ext) => ext.to_string_lossy().to_lowercase(),
            None => return false,
        };

        if !Category::from_extension(&ext).is_recognized() {
            return false;
        }

        if let Ok(metadata) = std::fs::metadata(path) {
            if metadata.len() > self.config.max_file_size {
                log::debug!(
                    "Skipping {} (too large: {} bytes)",
                    path.display(),
                    metadata.len()
                );
                return false;
            }
        }

        true
    }

    /// Index a single file into a `FileRecord`
    ///
    /// Any stat or read failure is returned to the caller, which skips the
    /// file and continues the build.
    pub fn index_file(&self, root: &Path, path: &Path) -> Result<FileRecord> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat file: {}", path.display()))?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let last_modified_epoch_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let absolute_path = std::path::absolute(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .to_string();

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let category = Category::from_extension(&extension);
        let extraction = extract::extract(&content, category);
        let tags = tagger::tag(&relative_path, &content, category);
        let content_hash = hash_content(content.as_bytes());
        let line_count = content.split('\n').count();

        Ok(FileRecord {
            absolute_path,
            relative_path,
            name,
            extension,
            size_bytes: metadata.len(),
            last_modified_epoch_ms,
            category,
            line_count,
            declared_symbols: extraction.declared_symbols,
            import_refs: extraction.import_refs,
            export_refs: extraction.export_refs,
            keyword_hits: extraction.keyword_hits,
            tags,
            content_hash,
            content,
        })
    }
}

/// Compute a blake3 hex digest for change detection
fn hash_content(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_index_file_produces_record() {
        let temp = TempDir::new().unwrap();
        let path = write_file(
            temp.path(),
            "src/user.js",
            "import { db } from './db';\nexport function getUser(id) {\n  return db.get(id);\n}\n",
        );

        let indexer = Indexer::new(IndexConfig::default());
        let record = indexer.index_file(temp.path(), &path).unwrap();

        assert_eq!(record.relative_path, "src/user.js");
        assert_eq!(record.name, "user");
        assert_eq!(record.extension, "js");
        assert_eq!(record.category, Category::Script);
        assert!(record.declared_symbols.contains(&"getUser".to_string()));
        assert_eq!(record.import_refs, vec!["./db"]);
        assert!(record.tags.contains("module"));
        assert_eq!(record.line_count, 5); // four lines plus trailing segment
        assert!(record.size_bytes > 0);
    }

    #[test]
    fn test_content_hash_deterministic() {
        let temp = TempDir::new().unwrap();
        let path = write_file(temp.path(), "a.js", "const x = 1;\n");

        let indexer = Indexer::new(IndexConfig::default());
        let first = indexer.index_file(temp.path(), &path).unwrap();
        let second = indexer.index_file(temp.path(), &path).unwrap();
        assert_eq!(first.content_hash, second.content_hash);

        std::fs::write(&path, "const x = 2;\n").unwrap();
        let third = indexer.index_file(temp.path(), &path).unwrap();
        assert_ne!(first.content_hash, third.content_hash);
    }

    #[test]
    fn test_scan_prunes_excluded_dirs() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "src/app.js", "let a = 1;");
        write_file(temp.path(), "node_modules/pkg/index.js", "let b = 2;");
        write_file(temp.path(), "dist/bundle.js", "let c = 3;");
        write_file(temp.path(), ".fathom/index.json", "{}");

        let indexer = Indexer::new(IndexConfig::default());
        let files = indexer.scan(temp.path()).unwrap();

        let rels: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(temp.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(rels, vec!["src/app.js"]);
    }

    #[test]
    fn test_scan_skips_unrecognized_extensions() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "main.js", "let a = 1;");
        write_file(temp.path(), "binary.dat", "xxxx");
        write_file(temp.path(), "no_extension", "yyyy");

        let indexer = Indexer::new(IndexConfig::default());
        let files = indexer.scan(temp.path()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_index_skips_unreadable_files() {
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "ok.js", "let a = 1;");
        // Invalid UTF-8 makes read_to_string fail; the file is skipped
        std::fs::write(temp.path().join("bad.js"), [0xff, 0xfe, 0x00, 0xc0]).unwrap();

        let indexer = Indexer::new(IndexConfig::default());
        let records = indexer.index(temp.path(), false).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative_path, "ok.js");
    }
}
