//! Per-build registry of tree-sitter parsers.

use super::Language;
use crate::IndexerError;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Lazily constructs one parser per language and hands out the same
/// instance for every later file of that language.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<Language, tree_sitter::Parser>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the parser for `language`, constructing it on first use.
    pub fn get_or_create(
        &mut self,
        language: Language,
    ) -> Result<&mut tree_sitter::Parser, IndexerError> {
        if !self.parsers.contains_key(&language) {
            let mut parser = tree_sitter::Parser::new();
            parser
                .set_language(&language.grammar())
                .map_err(|e| IndexerError::Parse {
                    path: Path::new(language.id()).to_path_buf(),
                    message: format!("Failed to set language: {}", e),
                })?;
            debug!(language = %language, "Parser created");
            self.parsers.insert(language, parser);
        }

        self.parsers
            .get_mut(&language)
            .ok_or_else(|| IndexerError::UnsupportedLanguage(language.id().to_string()))
    }

    /// Parse `source` with the parser for `language`.
    pub fn parse(
        &mut self,
        language: Language,
        source: &[u8],
        path: &Path,
    ) -> Result<tree_sitter::Tree, IndexerError> {
        let parser = self.get_or_create(language)?;
        parser
            .parse(source, None)
            .ok_or_else(|| IndexerError::parse(path, "Failed to parse content"))
    }

    /// Number of parsers constructed so far.
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Whether no parser has been constructed yet.
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
