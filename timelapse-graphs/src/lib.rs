pub mod extract;
pub mod languages;

use serde::{Deserialize, Serialize};

pub use extract::SymbolExtractor;
pub use languages::{LanguageRegistry, LanguageSupport};

/// Error type for the symbol engine.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

// ── Symbol kind ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Type,
    Module,
}

// ── Span type ──────────────────────────────────────────────────────

/// Line range of one named declaration, 1-indexed and inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolSpan {
    /// Dot-joined path of enclosing declarations plus the declaration's own name.
    pub name: String,
    pub kind: SymbolKind,
    pub start_line: usize,
    pub end_line: usize,
}

impl SymbolSpan {
    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// True when `other` lies entirely inside this span.
    pub fn encloses(&self, other: &SymbolSpan) -> bool {
        self.start_line <= other.start_line && other.end_line <= self.end_line
    }
}

// ── Extraction output ──────────────────────────────────────────────

/// Result of symbol extraction for one file at one commit.
///
/// `Empty` covers every case where no declaration could be located:
/// unsupported language, binary content, syntax errors, or a file with no
/// declarations at all. Callers switch to hunk-header attribution on `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolTable {
    Resolved(Vec<SymbolSpan>),
    #[default]
    Empty,
}

impl SymbolTable {
    pub fn from_spans(spans: Vec<SymbolSpan>) -> Self {
        if spans.is_empty() {
            Self::Empty
        } else {
            Self::Resolved(spans)
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn spans(&self) -> &[SymbolSpan] {
        match self {
            Self::Resolved(spans) => spans,
            Self::Empty => &[],
        }
    }

    pub fn get(&self, name: &str) -> Option<&SymbolSpan> {
        self.spans().iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.spans().len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans().is_empty()
    }
}
