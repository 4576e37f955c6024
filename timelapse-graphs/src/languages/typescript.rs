use crate::SymbolSpan;

use super::LanguageSupport;
use super::ecma::walk_ecma_node;
use super::helpers::SpanCollector;

#[derive(Debug)]
pub struct TypeScriptSupport;

impl LanguageSupport for TypeScriptSupport {
    fn id(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "mts", "cts"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn collect_spans(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<SymbolSpan> {
        collect_ts_spans(tree, source)
    }
}

/// TSX needs its own grammar: JSX elements are syntax errors in plain TypeScript.
#[derive(Debug)]
pub struct TsxSupport;

impl LanguageSupport for TsxSupport {
    fn id(&self) -> &'static str {
        "tsx"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tsx"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }

    fn collect_spans(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<SymbolSpan> {
        collect_ts_spans(tree, source)
    }
}

fn collect_ts_spans(tree: &tree_sitter::Tree, source: &str) -> Vec<SymbolSpan> {
    let mut spans = SpanCollector::new();
    let mut context: Vec<String> = Vec::new();
    walk_ecma_node(tree.root_node(), source, &mut context, &mut spans);
    spans.finish()
}
