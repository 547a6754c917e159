//! Source tree scanning.
//!
//! Walks a codebase, resolves each file's language, parses it with a
//! per-build parser registry and hands the tree to the language visitor.

mod language;
mod parser;
mod walker;

pub use language::{detect_language, Language};
pub use parser::ParserRegistry;
pub use walker::{FileEntry, Walker};

use crate::visitors::{self, Diagnostic, EntitySink};
use crate::IndexerError;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters from one build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    /// Regular, non-hidden files found by the walk
    pub files_seen: usize,
    /// Files parsed and visited without error
    pub files_indexed: usize,
    /// Files with no known language
    pub files_skipped: usize,
    /// Files that failed to read, parse or visit
    pub files_failed: usize,
    /// Entities inserted into the sink
    pub entities: usize,
    /// Node-level errors swallowed by tolerant visitors
    pub diagnostics: Vec<Diagnostic>,
    /// Build duration in milliseconds
    pub duration_ms: u64,
}

/// Builds the entity graph of a directory tree into an [`EntitySink`].
#[derive(Debug, Default)]
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Index every supported file under `root`.
    ///
    /// A file that fails to read, parse or visit is logged and counted; the
    /// build carries on. Failing to construct a parser is fatal.
    pub fn build(&self, root: &Path, sink: &mut dyn EntitySink) -> Result<BuildStats, IndexerError> {
        let start = Instant::now();
        let root = root
            .canonicalize()
            .map_err(|_| IndexerError::NotFound(root.to_path_buf()))?;

        info!(path = ?root, "Building code knowledge graph");

        let entries = Walker::new(&root).walk()?;
        debug!(count = entries.len(), "Files discovered");

        let mut registry = ParserRegistry::new();
        let mut stats = BuildStats::default();

        for entry in entries {
            stats.files_seen += 1;

            let Some(language) = detect_language(&entry.path) else {
                debug!(path = ?entry.path, "Skipping file with unknown language");
                stats.files_skipped += 1;
                continue;
            };
            registry.get_or_create(language)?;

            match index_file(&mut registry, language, &entry.path, sink) {
                Ok((inserted, diagnostics)) => {
                    stats.files_indexed += 1;
                    stats.entities += inserted;
                    for d in &diagnostics {
                        debug!(path = %d.file_path, line = d.line, message = %d.message, "Extraction error skipped");
                    }
                    stats.diagnostics.extend(diagnostics);
                }
                Err(e) => {
                    warn!(path = ?entry.path, language = %language, error = %e, "Failed to index file");
                    stats.files_failed += 1;
                }
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            files = stats.files_indexed,
            skipped = stats.files_skipped,
            failed = stats.files_failed,
            entities = stats.entities,
            parsers = registry.len(),
            duration_ms = stats.duration_ms,
            "Build complete"
        );

        Ok(stats)
    }
}

fn index_file(
    registry: &mut ParserRegistry,
    language: Language,
    path: &Path,
    sink: &mut dyn EntitySink,
) -> Result<(usize, Vec<Diagnostic>), IndexerError> {
    let source = std::fs::read(path)?;
    let tree = registry.parse(language, &source, path)?;
    let file_path = path.to_string_lossy();
    visitors::extract(language, &tree, &source, &file_path, sink)
}
