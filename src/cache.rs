//! Durable storage for the index
//!
//! The cache module handles the `.fathom/` directory structure:
//! - `index.json`: the persisted index snapshot (files, tags, dependencies,
//!   totals) in the documented JSON store format
//!
//! The on-disk copy is a convenience: the in-memory snapshot is always
//! authoritative for the running process, and a failed save only logs.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::IndexSnapshot;

/// Default cache directory name
pub const CACHE_DIR: &str = ".fathom";

/// File names within the cache directory
pub const INDEX_JSON: &str = "index.json";

/// Manages the Fathom cache directory
pub struct CacheManager {
    cache_path: PathBuf,
}

impl CacheManager {
    /// Create a new cache manager for the given root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        let cache_path = root.as_ref().join(CACHE_DIR);
        Self { cache_path }
    }

    /// Initialize the cache directory if it doesn't exist
    pub fn init(&self) -> Result<()> {
        if !self.cache_path.exists() {
            std::fs::create_dir_all(&self.cache_path)
                .with_context(|| format!("Failed to create cache dir {:?}", self.cache_path))?;
            log::info!("Initialized cache at {:?}", self.cache_path);
        }
        Ok(())
    }

    /// Check if a persisted index exists
    pub fn exists(&self) -> bool {
        self.index_path().exists()
    }

    /// Get the cache directory path
    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    fn index_path(&self) -> PathBuf {
        self.cache_path.join(INDEX_JSON)
    }

    /// Load the persisted snapshot
    ///
    /// Returns an error for a missing or malformed store; callers fall back
    /// to an empty snapshot (load failures are never fatal).
    pub fn load(&self) -> Result<IndexSnapshot> {
        let path = self.index_path();
        let file =
            File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        let snapshot: IndexSnapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Malformed index store at {}", path.display()))?;
        log::info!(
            "Loaded persisted index: {} files from {:?}",
            snapshot.total_files,
            path
        );
        Ok(snapshot)
    }

    /// Persist a snapshot to the store
    ///
    /// Writes to a temporary file first and renames into place, so a crash
    /// mid-write cannot corrupt an existing store.
    pub fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        self.init()?;

        let path = self.index_path();
        let tmp_path = self.cache_path.join(format!("{}.tmp", INDEX_JSON));

        let file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        serde_json::to_writer(BufWriter::new(file), snapshot)
            .context("Failed to serialize index store")?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        log::info!("Saved index: {} files to {:?}", snapshot.total_files, path);
        Ok(())
    }

    /// Remove the cache directory entirely
    pub fn clear(&self) -> Result<()> {
        if self.cache_path.exists() {
            std::fs::remove_dir_all(&self.cache_path)
                .with_context(|| format!("Failed to remove {:?}", self.cache_path))?;
            log::info!("Cleared cache at {:?}", self.cache_path);
        }
        Ok(())
    }
}
