use crate::{SymbolKind, SymbolSpan};

use super::LanguageSupport;
use super::helpers::{SpanCollector, child_by_field, node_text};

#[derive(Debug)]
pub struct JavaSupport;

impl LanguageSupport for JavaSupport {
    fn id(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn collect_spans(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<SymbolSpan> {
        let mut spans = SpanCollector::new();
        let mut context: Vec<String> = Vec::new();
        walk_java_node(tree.root_node(), source, &mut context, &mut spans);
        spans.finish()
    }
}

fn walk_java_node(
    node: tree_sitter::Node<'_>,
    source: &str,
    context: &mut Vec<String>,
    spans: &mut SpanCollector,
) {
    let kind = match node.kind() {
        "class_declaration"
        | "interface_declaration"
        | "enum_declaration"
        | "record_declaration" => Some(SymbolKind::Type),
        "method_declaration" | "constructor_declaration" => Some(SymbolKind::Function),
        _ => None,
    };

    if let Some(kind) = kind {
        if let Some(name_node) = child_by_field(node, "name") {
            let name = node_text(name_node, source).to_string();
            spans.push(context, &name, kind, node);

            context.push(name);
            walk_java_children(node, source, context, spans);
            context.pop();
            return;
        }
    }

    walk_java_children(node, source, context, spans);
}

fn walk_java_children(
    node: tree_sitter::Node<'_>,
    source: &str,
    context: &mut Vec<String>,
    spans: &mut SpanCollector,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_java_node(child, source, context, spans);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_classes_and_methods() {
        let source = r"public class Outer {
    public Outer() {}

    static class Inner {
        int size() {
            return 0;
        }
    }
}
";
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        let spans = JavaSupport.collect_spans(&tree, source);

        let names: Vec<_> = spans.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Outer", "Outer.Outer", "Outer.Inner", "Outer.Inner.size"]
        );
        assert_eq!((spans[0].start_line, spans[0].end_line), (1, 9));
        assert_eq!((spans[3].start_line, spans[3].end_line), (5, 7));
    }
}
