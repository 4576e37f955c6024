use crate::{SymbolKind, SymbolSpan};

use super::LanguageSupport;
use super::helpers::{SpanCollector, bare_type_name, child_by_field, find_child_by_kind, node_text};

#[derive(Debug)]
pub struct GoSupport;

impl LanguageSupport for GoSupport {
    fn id(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn collect_spans(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<SymbolSpan> {
        let mut spans = SpanCollector::new();
        let root = tree.root_node();
        let mut cursor = root.walk();
        // Go has no nested named declarations worth tracking: top level only.
        for node in root.children(&mut cursor) {
            match node.kind() {
                "function_declaration" => {
                    if let Some(name_node) = child_by_field(node, "name") {
                        let name = node_text(name_node, source);
                        spans.push(&[], name, SymbolKind::Function, node);
                    }
                }
                "method_declaration" => {
                    if let Some(name_node) = child_by_field(node, "name") {
                        let name = node_text(name_node, source);
                        let context: Vec<String> = receiver_type(node, source).into_iter().collect();
                        spans.push(&context, name, SymbolKind::Function, node);
                    }
                }
                "type_declaration" => {
                    let mut type_cursor = node.walk();
                    for spec in node.children(&mut type_cursor) {
                        if spec.kind() != "type_spec" {
                            continue;
                        }
                        if let Some(name_node) = child_by_field(spec, "name") {
                            let name = node_text(name_node, source);
                            spans.push(&[], name, SymbolKind::Type, spec);
                        }
                    }
                }
                _ => {}
            }
        }
        spans.finish()
    }
}

/// `func (s *Server) Start()` has receiver type `Server`.
fn receiver_type(method: tree_sitter::Node<'_>, source: &str) -> Option<String> {
    let receiver = child_by_field(method, "receiver")?;
    let param = find_child_by_kind(receiver, "parameter_declaration")?;
    let type_node = child_by_field(param, "type")?;
    Some(bare_type_name(node_text(type_node, source)).to_string())
}
