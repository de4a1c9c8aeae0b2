//! Tag derivation for indexed files
//!
//! Tags are free-form labels used for filtering: directory segments of the
//! relative path, the file's category, and a handful of content signals. All
//! rules are additive into one set.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::Category;

/// Structural directory names that carry no meaning as tags
const SEGMENT_STOPLIST: &[&str] = &["src", "lib", "source", "components", "views", "pages"];

fn interface_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:interface\s+[A-Za-z_$][A-Za-z0-9_$]*|type\s+[A-Za-z_$][A-Za-z0-9_$]*\s*=)")
            .expect("static regex")
    })
}

/// Derive the tag set for one file
pub fn tag(relative_path: &str, content: &str, category: Category) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();

    // Directory segments, minus structural names. The filename component is
    // not a tag; relative paths are normalized to `/` separators upstream.
    let mut segments: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
    segments.pop();
    for segment in segments {
        if !SEGMENT_STOPLIST.contains(&segment) {
            tags.insert(segment.to_string());
        }
    }

    tags.insert(category.to_string());

    let has_import = content.contains("import") || content.contains("require");
    let has_export = content.contains("export") || content.contains("module.exports");
    if has_import && has_export {
        tags.insert("module".to_string());
    }

    if content.contains("function") || content.contains("=>") {
        tags.insert("functionality".to_string());
    }

    if content.contains("class ") {
        tags.insert("class-based".to_string());
    }

    if interface_decl_re().is_match(content) {
        tags.insert("typescript".to_string());
    }

    tags
}
