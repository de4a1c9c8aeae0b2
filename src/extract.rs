//! Pattern-based structural extraction
//!
//! Extraction is deliberately regex-heuristic, not AST-based: patterns are
//! applied independently over raw content and may produce false positives
//! and negatives. Overlapping matches across extraction targets (a function
//! that is also exported, for example) are expected and kept.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::Category;

/// Structural facts extracted from one file's content
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extraction {
    /// Function- and class-like declarations, in match order, duplicates kept
    pub declared_symbols: Vec<String>,
    /// Module specifiers captured from import-like statements, verbatim
    pub import_refs: Vec<String>,
    /// References captured from export-like statements, verbatim
    pub export_refs: Vec<String>,
    /// Vocabulary keywords present anywhere in the content
    pub keyword_hits: BTreeSet<String>,
}

/// Identifiers never treated as the bare `name(...) {` function form.
///
/// The guard applies to that pattern only; the named-function and arrow
/// patterns are used as-is.
const CALL_FORM_STOPLIST: &[&str] = &["if", "for", "while", "catch"];

fn function_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bfunction\s+([A-Za-z_$][A-Za-z0-9_$]*)").expect("static regex")
    })
}

fn arrow_binding_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*(?:async\s+)?(?:\([^)\n]*\)|[A-Za-z_$][A-Za-z0-9_$]*)\s*=>",
        )
        .expect("static regex")
    })
}

fn call_form_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z_$][A-Za-z0-9_$]*)\s*\([^)\n]*\)\s*\{").expect("static regex")
    })
}

fn class_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bclass\s+([A-Za-z_$][A-Za-z0-9_$]*)").expect("static regex"))
}

fn import_statement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bimport\s+(?:[^'"\n]+\s+from\s+)?['"]([^'"]+)['"]"#).expect("static regex")
    })
}

fn dynamic_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("static regex")
    })
}

fn require_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("static regex")
    })
}

fn export_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\bexport\s+(?:default\s+)?(?:async\s+)?(?:function\*?|class|const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
        )
        .expect("static regex")
    })
}

fn export_braces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bexport\s*\{([^}]*)\}").expect("static regex"))
}

fn export_default_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bexport\s+default\s+([A-Za-z_$][A-Za-z0-9_$]*)").expect("static regex")
    })
}

fn keyword_re(keyword: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword))).expect("static regex")
}

/// Extract structural facts from file content
///
/// Symbols, imports, and exports are extracted only for script-like content;
/// keyword hits apply to any category with a vocabulary. Unknown categories
/// yield an empty extraction.
pub fn extract(content: &str, category: Category) -> Extraction {
    let mut extraction = Extraction::default();

    if category.is_script_like() {
        extraction.declared_symbols = extract_symbols(content);
        extraction.import_refs = extract_imports(content);
        extraction.export_refs = extract_exports(content);
    }

    for keyword in category.rules().keywords {
        if keyword_re(keyword).is_match(content) {
            extraction.keyword_hits.insert((*keyword).to_string());
        }
    }

    extraction
}

fn extract_symbols(content: &str) -> Vec<String> {
    let mut symbols = Vec::new();

    for caps in function_decl_re().captures_iter(content) {
        symbols.push(caps[1].to_string());
    }

    for caps in arrow_binding_re().captures_iter(content) {
        symbols.push(caps[1].to_string());
    }

    for caps in call_form_re().captures_iter(content) {
        let name = &caps[1];
        if !CALL_FORM_STOPLIST.contains(&name) {
            symbols.push(name.to_string());
        }
    }

    for caps in class_decl_re().captures_iter(content) {
        symbols.push(caps[1].to_string());
    }

    symbols
}

fn extract_imports(content: &str) -> Vec<String> {
    let mut refs = Vec::new();

    for caps in import_statement_re().captures_iter(content) {
        refs.push(caps[1].to_string());
    }

    for caps in dynamic_import_re().captures_iter(content) {
        refs.push(caps[1].to_string());
    }

    for caps in require_call_re().captures_iter(content) {
        refs.push(caps[1].to_string());
    }

    refs
}

fn extract_exports(content: &str) -> Vec<String> {
    let mut refs = Vec::new();

    for caps in export_decl_re().captures_iter(content) {
        refs.push(caps[1].to_string());
    }

    for caps in export_braces_re().captures_iter(content) {
        for entry in caps[1].split(',') {
            let entry = entry.trim();
            if !entry.is_empty() {
                refs.push(entry.to_string());
            }
        }
    }

    for caps in export_default_re().captures_iter(content) {
        let name = &caps[1];
        // The declaration pattern already covers `export default function foo`;
        // skip the keyword itself when the default expression is a declaration.
        if !matches!(name, "function" | "class" | "async") {
            refs.push(name.to_string());
        }
    }

    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_function_declarations() {
        let content = "function getUser() {}\nfunction saveUser(user) {}";
        let result = extract(content, Category::Script);
        // The call-like form matches the same declarations again; the
        // patterns are independent and overlap is preserved.
        assert_eq!(
            result.declared_symbols,
            vec!["getUser", "saveUser", "getUser", "saveUser"]
        );
    }

    #[test]
    fn test_arrow_bindings() {
        let content = "const fetchAll = async () => {};\nlet toName = user => user.name;";
        let result = extract(content, Category::Script);
        assert!(result.declared_symbols.contains(&"fetchAll".to_string()));
        assert!(result.declared_symbols.contains(&"toName".to_string()));
    }

    #[test]
    fn test_call_form_stoplist() {
        let content = "if (x) {\n}\nfor (;;) {\n}\nrender(props) {\n}";
        let result = extract(content, Category::Script);
        assert_eq!(result.declared_symbols, vec!["render"]);
    }

    #[test]
    fn test_stoplist_does_not_guard_other_patterns() {
        // The guard applies only to the bare call form
        let content = "function catch2() {}\ncatch (err) {\n}";
        let result = extract(content, Category::Script);
        assert!(result.declared_symbols.contains(&"catch2".to_string()));
        assert!(!result.declared_symbols.contains(&"catch".to_string()));
    }

    #[test]
    fn test_duplicate_symbols_preserved() {
        // The arrow binding and the later call-like occurrence both count
        let content = "const run = () => {};\nrun(args) {\n}";
        let result = extract(content, Category::Script);
        assert_eq!(result.declared_symbols, vec!["run", "run"]);
    }

    #[test]
    fn test_class_declarations() {
        let content = "class UserService extends Base {}\nexport class Widget {}";
        let result = extract(content, Category::Script);
        assert!(result.declared_symbols.contains(&"UserService".to_string()));
        assert!(result.declared_symbols.contains(&"Widget".to_string()));
    }

    #[test]
    fn test_import_forms() {
        let content = concat!(
            "import { foo } from './a';\n",
            "import * as util from '../util';\n",
            "import 'side-effect';\n",
            "const lazy = await import('./lazy');\n",
            "const legacy = require('./legacy');\n",
        );
        let result = extract(content, Category::Script);
        assert_eq!(
            result.import_refs,
            vec!["./a", "../util", "side-effect", "./lazy", "./legacy"]
        );
    }

    #[test]
    fn test_export_forms() {
        let content = concat!(
            "export function handler() {}\n",
            "export default class App {}\n",
            "export { first, second as aliased };\n",
            "export default app;\n",
        );
        let result = extract(content, Category::Script);
        assert!(result.export_refs.contains(&"handler".to_string()));
        assert!(result.export_refs.contains(&"App".to_string()));
        assert!(result.export_refs.contains(&"first".to_string()));
        assert!(result.export_refs.contains(&"second as aliased".to_string()));
        assert!(result.export_refs.contains(&"app".to_string()));
        assert!(!result.export_refs.contains(&"class".to_string()));
    }

    #[test]
    fn test_keyword_hits_are_a_set() {
        let content = "function a() {}\nfunction b() {}\nconst x = 1;";
        let result = extract(content, Category::Script);
        // "function" occurs twice but is recorded once
        assert!(result.keyword_hits.contains("function"));
        assert!(result.keyword_hits.contains("const"));
        assert_eq!(
            result.keyword_hits.iter().filter(|k| *k == "function").count(),
            1
        );
    }

    #[test]
    fn test_keyword_whole_word_only() {
        let content = "constellation mapping";
        let result = extract(content, Category::Script);
        assert!(!result.keyword_hits.contains("const"));
    }

    #[test]
    fn test_non_script_categories_skip_structure() {
        let content = "function looksLikeCode() {}";
        let result = extract(content, Category::Documentation);
        assert!(result.declared_symbols.is_empty());
        assert!(result.import_refs.is_empty());
        assert!(result.export_refs.is_empty());
    }

    #[test]
    fn test_stylesheet_keywords() {
        let content = ".box { display: flex; margin: 0; }";
        let result = extract(content, Category::Stylesheet);
        assert!(result.keyword_hits.contains("display"));
        assert!(result.keyword_hits.contains("flex"));
        assert!(result.keyword_hits.contains("margin"));
    }

    #[test]
    fn test_unknown_category_yields_empty() {
        let result = extract("anything at all", Category::Unknown);
        assert_eq!(result, Extraction::default());
    }
}
