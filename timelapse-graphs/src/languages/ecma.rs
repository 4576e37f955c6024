// Shared declaration walker for JavaScript and TypeScript grammars.
//
// Both grammars use the same node kinds for functions, classes and methods;
// TypeScript adds interfaces, enums, abstract classes and namespaces.

use crate::SymbolKind;

use super::helpers::{SpanCollector, child_by_field, node_text};

pub(super) fn walk_ecma_node(
    node: tree_sitter::Node<'_>,
    source: &str,
    context: &mut Vec<String>,
    spans: &mut SpanCollector,
) {
    let kind = match node.kind() {
        "function_declaration" | "generator_function_declaration" | "method_definition" => {
            Some(SymbolKind::Function)
        }
        "class_declaration"
        | "abstract_class_declaration"
        | "interface_declaration"
        | "enum_declaration" => Some(SymbolKind::Type),
        "internal_module" | "module" => Some(SymbolKind::Module),
        "variable_declarator" if is_function_value(node) => Some(SymbolKind::Function),
        _ => None,
    };

    if let Some(kind) = kind {
        if let Some(name_node) = child_by_field(node, "name") {
            let name = node_text(name_node, source).to_string();
            spans.push(context, &name, kind, node);

            context.push(name);
            walk_ecma_children(node, source, context, spans);
            context.pop();
            return;
        }
    }

    walk_ecma_children(node, source, context, spans);
}

fn walk_ecma_children(
    node: tree_sitter::Node<'_>,
    source: &str,
    context: &mut Vec<String>,
    spans: &mut SpanCollector,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_ecma_node(child, source, context, spans);
    }
}

/// `const handler = () => {}` and `let f = function () {}` declare functions.
fn is_function_value(declarator: tree_sitter::Node<'_>) -> bool {
    child_by_field(declarator, "value").is_some_and(|value| {
        matches!(
            value.kind(),
            "arrow_function" | "function_expression" | "function" | "generator_function"
        )
    })
}
