// Best-effort symbol extraction: file text in, declaration spans out.

use std::path::Path;

use tracing::debug;

use crate::{GraphError, LanguageRegistry, Result, SymbolSpan, SymbolTable};

/// Parses a file's full text and returns its declaration spans.
///
/// Extraction never fails from the caller's point of view: every error path
/// collapses to [`SymbolTable::Empty`], which is the trigger for the
/// hunk-header fallback downstream. Use [`SymbolExtractor::try_extract`] to
/// see why a file produced no table.
#[derive(Debug, Default)]
pub struct SymbolExtractor {
    registry: LanguageRegistry,
}

impl SymbolExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: LanguageRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn extract(&self, path: &Path, source: &str) -> SymbolTable {
        match self.try_extract(path, source) {
            Ok(spans) => SymbolTable::from_spans(spans),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Symbol extraction fell back to empty table");
                SymbolTable::Empty
            }
        }
    }

    pub fn try_extract(&self, path: &Path, source: &str) -> Result<Vec<SymbolSpan>> {
        let lang = self
            .registry
            .for_file(path)
            .ok_or_else(|| GraphError::UnsupportedLanguage(path.display().to_string()))?;

        if source.contains('\0') {
            return Err(GraphError::Parse {
                path: path.display().to_string(),
                message: "binary content".to_string(),
            });
        }

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&lang.tree_sitter_language())
            .map_err(|e| GraphError::TreeSitter(e.to_string()))?;

        let tree = parser.parse(source, None).ok_or_else(|| GraphError::Parse {
            path: path.display().to_string(),
            message: "parser returned no tree".to_string(),
        })?;

        if tree.root_node().has_error() {
            return Err(GraphError::Parse {
                path: path.display().to_string(),
                message: "source contains syntax errors".to_string(),
            });
        }

        Ok(lang.collect_spans(&tree, source))
    }
}
