//! Static extraction rules per file category
//!
//! Each category carries three rule sets: comment prefixes (used only as a
//! heuristic to drop commented-out lines during content search), string
//! delimiter characters (same purpose, for lines that sit inside a literal),
//! and the keyword vocabulary probed by the content extractor.
//!
//! The registry is a fixed compile-time table. There is deliberately no way
//! to register categories or mutate rules at runtime.

use crate::models::Category;

/// Heuristic rule set for one category
#[derive(Debug)]
pub struct CategoryRules {
    /// Line prefixes (after trimming) treated as commented-out
    pub comment_prefixes: &'static [&'static str],
    /// Characters that open/close string literals; a line with an odd total
    /// count of these is treated as inside a literal
    pub string_delimiters: &'static [char],
    /// Vocabulary probed with whole-word matching
    pub keywords: &'static [&'static str],
}

static SCRIPT_RULES: CategoryRules = CategoryRules {
    comment_prefixes: &["//", "*", "/*"],
    string_delimiters: &['"', '\'', '`'],
    keywords: &[
        "function", "class", "import", "export", "const", "let", "var", "async", "await",
        "return", "require", "module", "interface", "type", "extends", "promise",
    ],
};

static MARKUP_RULES: CategoryRules = CategoryRules {
    comment_prefixes: &["<!--"],
    string_delimiters: &['"', '\''],
    keywords: &[
        "html", "head", "body", "div", "span", "script", "style", "link", "meta", "template",
        "form", "input", "button",
    ],
};

static STYLESHEET_RULES: CategoryRules = CategoryRules {
    comment_prefixes: &["/*", "*", "//"],
    string_delimiters: &['"', '\''],
    keywords: &[
        "color", "background", "margin", "padding", "border", "display", "flex", "grid",
        "position", "font", "width", "height", "media", "animation",
    ],
};

static STRUCTURED_DATA_RULES: CategoryRules = CategoryRules {
    comment_prefixes: &["#"],
    string_delimiters: &['"'],
    keywords: &[
        "name", "version", "dependencies", "scripts", "config", "description", "main",
        "license", "author",
    ],
};

static DOCUMENTATION_RULES: CategoryRules = CategoryRules {
    comment_prefixes: &[],
    string_delimiters: &[],
    keywords: &[
        "install", "usage", "api", "example", "configuration", "license", "setup",
        "getting started", "todo",
    ],
};

static UNKNOWN_RULES: CategoryRules = CategoryRules {
    comment_prefixes: &[],
    string_delimiters: &[],
    keywords: &[],
};

impl Category {
    /// Look up the static rule set for this category
    pub fn rules(&self) -> &'static CategoryRules {
        match self {
            Category::Script => &SCRIPT_RULES,
            Category::Markup => &MARKUP_RULES,
            Category::Stylesheet => &STYLESHEET_RULES,
            Category::StructuredData => &STRUCTURED_DATA_RULES,
            Category::Documentation => &DOCUMENTATION_RULES,
            Category::Unknown => &UNKNOWN_RULES,
        }
    }
}

/// Check whether a content line should be skipped during content search
///
/// A line is skipped when its trimmed form starts with one of the category's
/// comment prefixes, or when it contains an odd total count of the category's
/// string delimiter characters (a cheap "inside a string literal" signal).
/// Both checks are heuristics and accept false positives/negatives.
pub fn line_is_excluded(line: &str, rules: &CategoryRules) -> bool {
    let trimmed = line.trim_start();
    if rules
        .comment_prefixes
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
    {
        return true;
    }

    if !rules.string_delimiters.is_empty() {
        let delimiter_count = line
            .chars()
            .filter(|c| rules.string_delimiters.contains(c))
            .count();
        if delimiter_count % 2 != 0 {
            return true;
        }
    }

    false
}
