use std::collections::HashMap;

use tree_sitter::Node;

use crate::{SymbolKind, SymbolSpan};

/// Extract the source text for a tree-sitter node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Find the first child with a specific kind.
pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|child| child.kind() == kind)
}

/// Find a child by field name.
pub fn child_by_field<'a>(node: Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

/// Build a qualified name from a scope context stack using `.` separator.
pub fn dotted_name(context: &[String], name: &str) -> String {
    if context.is_empty() {
        name.to_string()
    } else {
        format!("{}.{name}", context.join("."))
    }
}

/// Strip pointer sigils, references and generic arguments from a type name.
///
/// `*Server` -> `Server`, `Cache<K, V>` -> `Cache`, `&'a mut Foo` -> `Foo`.
pub fn bare_type_name(text: &str) -> &str {
    let head = text.split('<').next().unwrap_or(text);
    let head = head.rsplit(['&', '*', ' ']).next().unwrap_or(head);
    head.rsplit("::").next().unwrap_or(head).trim()
}

/// 1-indexed inclusive line span of a node.
///
/// A node whose end point sits at column 0 of a later row ends on the
/// previous line (the trailing newline belongs to the node, the next line
/// does not).
pub fn line_span(node: Node<'_>) -> (usize, usize) {
    let start = node.start_position();
    let end = node.end_position();
    let start_line = start.row + 1;
    let end_line = if end.column == 0 && end.row > start.row {
        end.row
    } else {
        end.row + 1
    };
    (start_line, end_line.max(start_line))
}

/// Accumulates spans in declaration order, one entry per qualified name.
#[derive(Debug, Default)]
pub struct SpanCollector {
    spans: Vec<SymbolSpan>,
    index: HashMap<String, usize>,
}

impl SpanCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` as the declaration `name` nested under `context`.
    ///
    /// Redefinitions keep the original position and take the later span.
    pub fn push(&mut self, context: &[String], name: &str, kind: SymbolKind, node: Node<'_>) {
        let qualified = dotted_name(context, name);
        let (start_line, end_line) = line_span(node);
        let span = SymbolSpan {
            name: qualified.clone(),
            kind,
            start_line,
            end_line,
        };
        if let Some(&pos) = self.index.get(&qualified) {
            self.spans[pos] = span;
        } else {
            self.index.insert(qualified, self.spans.len());
            self.spans.push(span);
        }
    }

    pub fn finish(self) -> Vec<SymbolSpan> {
        self.spans
    }
}
