//! Fathom: local-first file indexing and search for project trees
//!
//! Fathom scans a project directory, extracts lightweight structural facts
//! from each file with pattern heuristics (declared symbols, import/export
//! references, keywords, tags), persists a searchable JSON index in
//! `.fathom/`, and answers ranked queries against it with result caching.
//!
//! # Architecture
//!
//! - **Indexer**: Walks the tree, classifies files by extension, extracts
//!   facts; per-file work is independent and runs on a bounded thread pool
//! - **Store**: Assembles immutable snapshots and derives the tag and
//!   dependency indices from the files map
//! - **Query**: Executes ranked searches against the current snapshot, with
//!   a memoizing cache that empties on every rebuild
//! - **System**: The explicit facade owning the snapshot swap, persistence,
//!   and the operation set the CLI and HTTP surfaces need
//!
//! # Example Usage
//!
//! ```no_run
//! use fathom::{IndexConfig, IndexSystem, SearchOptions};
//!
//! let system = IndexSystem::open(".", IndexConfig::default());
//! system.build_index(false).unwrap();
//!
//! let results = system.search("getUser", &SearchOptions::default());
//! println!("{} hits", results.len());
//! ```

pub mod cache;
pub mod cli;
pub mod extract;
pub mod indexer;
pub mod models;
pub mod output;
pub mod query;
pub mod rules;
pub mod store;
pub mod system;
pub mod tagger;

// Re-export commonly used types
pub use cache::CacheManager;
pub use indexer::Indexer;
pub use models::{Category, FileRecord, IndexConfig, IndexSnapshot, IndexStats, MatchKind, SearchResult};
pub use query::{QueryCache, SearchOptions};
pub use system::IndexSystem;
