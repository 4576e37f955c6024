use crate::{SymbolKind, SymbolSpan};

use super::LanguageSupport;
use super::helpers::{SpanCollector, child_by_field, node_text};

#[derive(Debug)]
pub struct PythonSupport;

impl LanguageSupport for PythonSupport {
    fn id(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn collect_spans(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<SymbolSpan> {
        let mut spans = SpanCollector::new();
        let mut context: Vec<String> = Vec::new();
        walk_python_node(tree.root_node(), source, &mut context, &mut spans);
        spans.finish()
    }
}

// Decorators sit on the enclosing `decorated_definition`, so the span of the
// inner definition starts at its `def`/`class` line.
fn walk_python_node(
    node: tree_sitter::Node<'_>,
    source: &str,
    context: &mut Vec<String>,
    spans: &mut SpanCollector,
) {
    let kind = match node.kind() {
        "function_definition" => Some(SymbolKind::Function),
        "class_definition" => Some(SymbolKind::Type),
        _ => None,
    };

    if let Some(kind) = kind {
        if let Some(name_node) = child_by_field(node, "name") {
            let name = node_text(name_node, source).to_string();
            spans.push(context, &name, kind, node);

            context.push(name);
            walk_python_children(node, source, context, spans);
            context.pop();
            return;
        }
    }

    walk_python_children(node, source, context, spans);
}

fn walk_python_children(
    node: tree_sitter::Node<'_>,
    source: &str,
    context: &mut Vec<String>,
    spans: &mut SpanCollector,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_python_node(child, source, context, spans);
    }
}
