use crate::SymbolSpan;

use super::LanguageSupport;
use super::ecma::walk_ecma_node;
use super::helpers::SpanCollector;

#[derive(Debug)]
pub struct JavaScriptSupport;

impl LanguageSupport for JavaScriptSupport {
    fn id(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn collect_spans(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<SymbolSpan> {
        let mut spans = SpanCollector::new();
        let mut context: Vec<String> = Vec::new();
        walk_ecma_node(tree.root_node(), source, &mut context, &mut spans);
        spans.finish()
    }
}
