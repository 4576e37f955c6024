use crate::{SymbolKind, SymbolSpan};

use super::LanguageSupport;
use super::helpers::{SpanCollector, bare_type_name, child_by_field, node_text};

#[derive(Debug)]
pub struct RustSupport;

impl LanguageSupport for RustSupport {
    fn id(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn collect_spans(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<SymbolSpan> {
        let mut spans = SpanCollector::new();
        let mut context: Vec<String> = Vec::new();
        walk_rust_node(tree.root_node(), source, &mut context, &mut spans);
        spans.finish()
    }
}

fn walk_rust_node(
    node: tree_sitter::Node<'_>,
    source: &str,
    context: &mut Vec<String>,
    spans: &mut SpanCollector,
) {
    match node.kind() {
        "function_item" | "function_signature_item" => {
            if let Some(name_node) = child_by_field(node, "name") {
                let name = node_text(name_node, source).to_string();
                spans.push(context, &name, SymbolKind::Function, node);

                // Nested fns inside a body are qualified by their parent.
                context.push(name);
                walk_children(node, source, context, spans);
                context.pop();
                return;
            }
        }
        "struct_item" | "enum_item" | "union_item" | "type_item" => {
            if let Some(name_node) = child_by_field(node, "name") {
                let name = node_text(name_node, source).to_string();
                spans.push(context, &name, SymbolKind::Type, node);
                return;
            }
        }
        "trait_item" | "mod_item" => {
            if let Some(name_node) = child_by_field(node, "name") {
                let name = node_text(name_node, source).to_string();
                let kind = if node.kind() == "mod_item" {
                    SymbolKind::Module
                } else {
                    SymbolKind::Type
                };
                spans.push(context, &name, kind, node);

                context.push(name);
                walk_children(node, source, context, spans);
                context.pop();
                return;
            }
        }
        "impl_item" => {
            // The impl block is a scope only; its methods carry the spans.
            if let Some(type_node) = child_by_field(node, "type") {
                let type_name = bare_type_name(node_text(type_node, source)).to_string();
                context.push(type_name);
                walk_children(node, source, context, spans);
                context.pop();
                return;
            }
        }
        _ => {}
    }

    walk_children(node, source, context, spans);
}

fn walk_children(
    node: tree_sitter::Node<'_>,
    source: &str,
    context: &mut Vec<String>,
    spans: &mut SpanCollector,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_rust_node(child, source, context, spans);
    }
}
