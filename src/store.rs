//! Snapshot assembly and derived index computation
//!
//! A build collects independently indexed `FileRecord`s into one immutable
//! `IndexSnapshot`. The tag and dependency indices are always recomputed
//! from the files map here; nothing else is allowed to write them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;

use crate::models::{FileRecord, IndexSnapshot};

/// Assemble a complete snapshot from indexed records
///
/// Records are keyed by relative path, last-write-wins on duplicates (which
/// should not occur given unique relative paths). Totals and both derived
/// indices are recomputed from scratch.
pub fn build_snapshot(records: Vec<FileRecord>) -> IndexSnapshot {
    let mut files = BTreeMap::new();
    for record in records {
        files.insert(record.relative_path.clone(), record);
    }

    let total_files = files.len();
    let total_size_bytes = files.values().map(|r| r.size_bytes).sum();
    let tag_index = derive_tag_index(&files);
    let dependency_index = derive_dependency_index(&files);

    IndexSnapshot {
        files,
        tag_index,
        dependency_index,
        total_files,
        total_size_bytes,
        last_updated_epoch_ms: Utc::now().timestamp_millis(),
    }
}

/// Invert `files[*].tags` into tag → ordered set of relative paths
pub fn derive_tag_index(
    files: &BTreeMap<String, FileRecord>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for record in files.values() {
        for tag in &record.tags {
            index
                .entry(tag.clone())
                .or_default()
                .insert(record.relative_path.clone());
        }
    }
    index
}

/// Infer file → dependents by textual reference matching
///
/// For every ordered pair (target, other), `other` is recorded as a
/// dependent of `target` when any of its import refs contains the target's
/// name or relative path as a substring. This is a loose textual heuristic,
/// not resolved-path dependency analysis; consumers rely on its looseness.
pub fn derive_dependency_index(
    files: &BTreeMap<String, FileRecord>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for target in files.values() {
        if target.name.is_empty() {
            continue;
        }
        for other in files.values() {
            if other.relative_path == target.relative_path {
                continue;
            }
            let references_target = other
                .import_refs
                .iter()
                .any(|r| r.contains(&target.name) || r.contains(&target.relative_path));
            if references_target {
                index
                    .entry(target.relative_path.clone())
                    .or_default()
                    .insert(other.relative_path.clone());
            }
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn record(relative_path: &str, imports: &[&str], tags: &[&str]) -> FileRecord {
        let path = std::path::Path::new(relative_path);
        FileRecord {
            absolute_path: format!("/project/{}", relative_path),
            relative_path: relative_path.to_string(),
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default(),
            size_bytes: 10,
            last_modified_epoch_ms: 0,
            category: Category::Script,
            content: String::new(),
            line_count: 1,
            declared_symbols: vec![],
            import_refs: imports.iter().map(|s| s.to_string()).collect(),
            export_refs: vec![],
            keyword_hits: BTreeSet::new(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            content_hash: String::new(),
        }
    }

    #[test]
    fn test_last_write_wins_on_duplicate_paths() {
        let mut first = record("src/a.js", &[], &[]);
        first.size_bytes = 1;
        let mut second = record("src/a.js", &[], &[]);
        second.size_bytes = 2;

        let snapshot = build_snapshot(vec![first, second]);
        assert_eq!(snapshot.total_files, 1);
        assert_eq!(snapshot.files["src/a.js"].size_bytes, 2);
    }

    #[test]
    fn test_totals() {
        let snapshot = build_snapshot(vec![
            record("a.js", &[], &[]),
            record("b.js", &[], &[]),
        ]);
        assert_eq!(snapshot.total_files, 2);
        assert_eq!(snapshot.total_size_bytes, 20);
        assert!(snapshot.last_updated_epoch_ms > 0);
    }

    #[test]
    fn test_tag_index_inversion_consistency() {
        let snapshot = build_snapshot(vec![
            record("src/a.js", &[], &["auth", "script"]),
            record("src/b.js", &[], &["auth"]),
        ]);

        assert_eq!(
            snapshot.tag_index["auth"],
            ["src/a.js", "src/b.js"]
                .iter()
                .map(|s| s.to_string())
                .collect::<BTreeSet<_>>()
        );

        // Inverting the index back reproduces exactly the (tag, file) pairs
        let mut pairs_from_index = Vec::new();
        for (tag, paths) in &snapshot.tag_index {
            for path in paths {
                pairs_from_index.push((tag.clone(), path.clone()));
            }
        }
        let mut pairs_from_files = Vec::new();
        for record in snapshot.files.values() {
            for tag in &record.tags {
                pairs_from_files.push((tag.clone(), record.relative_path.clone()));
            }
        }
        pairs_from_index.sort();
        pairs_from_files.sort();
        assert_eq!(pairs_from_index, pairs_from_files);
    }

    #[test]
    fn test_dependency_inference_by_name() {
        let snapshot = build_snapshot(vec![
            record("src/a.js", &[], &[]),
            record("src/b.js", &["./a"], &[]),
        ]);

        let dependents = &snapshot.dependency_index["src/a.js"];
        assert!(dependents.contains("src/b.js"));
        // No self-dependency, no reverse edge
        assert!(!dependents.contains("src/a.js"));
        assert!(!snapshot.dependency_index.contains_key("src/b.js"));
    }

    #[test]
    fn test_dependency_inference_is_loose() {
        // "auth" appears inside "./auth-helpers": substring matching links it
        let snapshot = build_snapshot(vec![
            record("src/auth.js", &[], &[]),
            record("src/login.js", &["./auth-helpers"], &[]),
        ]);
        assert!(snapshot.dependency_index["src/auth.js"].contains("src/login.js"));
    }

    #[test]
    fn test_rebuild_idempotent_modulo_timestamp() {
        let make = || {
            build_snapshot(vec![
                record("src/a.js", &["./b"], &["auth"]),
                record("src/b.js", &[], &["db"]),
            ])
        };
        let first = make();
        let second = make();
        assert_eq!(first.files, second.files);
        assert_eq!(first.tag_index, second.tag_index);
        assert_eq!(first.dependency_index, second.dependency_index);
    }
}
