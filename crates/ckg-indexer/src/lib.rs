//! CKG Indexer
//!
//! This crate provides the indexing engine for the code knowledge graph:
//! - Deterministic directory walks that skip hidden entries
//! - tree-sitter parsing with one lazily built parser per language
//! - Per-language visitors that extract functions, types and modules
//! - Snapshot fingerprints from git state or file metadata
//! - SQLite entity stores cached per fingerprint

pub mod entity;
mod error;
pub mod fingerprint;
pub mod scanner;
pub mod storage;
pub mod visitors;

pub use entity::{Entity, EntityDetails, EntityKind};
pub use error::IndexerError;
pub use fingerprint::{Fingerprint, FingerprintOptions, Fingerprinter};
pub use scanner::{detect_language, BuildStats, GraphBuilder, Language};
pub use storage::{CacheOptions, CkgCache, CkgStore, FunctionFilter, OpenOutcome, OpenedStore};
pub use visitors::{Diagnostic, EntitySink};
