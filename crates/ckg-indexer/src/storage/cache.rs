//! Store lifecycle keyed by snapshot fingerprint.
//!
//! The cache root holds one `<fingerprint>.db` per indexed snapshot and a
//! `storage_info.json` index mapping each absolute codebase path to the
//! fingerprint it was last built at.

use super::CkgStore;
use crate::fingerprint::{Fingerprint, FingerprintOptions, Fingerprinter};
use crate::scanner::{BuildStats, GraphBuilder, Walker};
use crate::IndexerError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

const INDEX_FILE: &str = "storage_info.json";

/// Cache options.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Directory holding databases and the path index
    pub root: PathBuf,
    /// Age after which `expire` removes a database
    pub retention: Duration,
    /// Git probe timeouts
    pub fingerprint: FingerprintOptions,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".ckg")
                .join("ckg"),
            retention: Duration::from_secs(7 * 24 * 60 * 60),
            fingerprint: FingerprintOptions::default(),
        }
    }
}

/// How `open` obtained its store.
#[derive(Debug)]
pub enum OpenOutcome {
    /// An existing database matched the current fingerprint
    Reused,
    /// A fresh database was built
    Built(BuildStats),
}

/// A store ready for queries.
pub struct OpenedStore {
    pub store: CkgStore,
    pub fingerprint: Fingerprint,
    pub outcome: OpenOutcome,
    pub db_path: PathBuf,
}

/// Opens, builds and expires fingerprinted entity stores.
pub struct CkgCache {
    options: CacheOptions,
    fingerprinter: Fingerprinter,
    builder: GraphBuilder,
    builds: AtomicUsize,
}

type PathIndex = BTreeMap<String, String>;

impl CkgCache {
    pub fn new(options: CacheOptions) -> Self {
        let fingerprinter = Fingerprinter::new(options.fingerprint.clone());
        Self {
            options,
            fingerprinter,
            builder: GraphBuilder::new(),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.options.root
    }

    /// Open the store for `codebase`, building it when the snapshot changed.
    pub fn open(&self, codebase: &Path) -> Result<OpenedStore, IndexerError> {
        self.open_with(codebase, false)
    }

    /// Open the store for `codebase`, always building a fresh one.
    pub fn rebuild(&self, codebase: &Path) -> Result<OpenedStore, IndexerError> {
        self.open_with(codebase, true)
    }

    /// Forget `codebase` and delete its database.
    ///
    /// Returns whether an index entry existed.
    pub fn invalidate(&self, codebase: &Path) -> Result<bool, IndexerError> {
        let key = codebase_key(&resolve(codebase).unwrap_or_else(|_| codebase.to_path_buf()));
        let mut index = self.load_index();
        let Some(fingerprint) = index.remove(&key) else {
            return Ok(false);
        };
        if !index.values().any(|fp| *fp == fingerprint) {
            remove_if_exists(&self.db_path_for(&fingerprint))?;
        }
        self.save_index(&index)?;
        info!(path = %key, fingerprint = %fingerprint, "Invalidated code knowledge graph");
        Ok(true)
    }

    /// Delete databases older than the retention window.
    ///
    /// Index entries whose database is gone are pruned. Returns the number
    /// of removed files.
    pub fn expire(&self) -> Result<usize, IndexerError> {
        if !self.options.root.is_dir() {
            return Ok(0);
        }

        let cutoff = chrono::Utc::now().timestamp() as f64 - self.options.retention.as_secs_f64();
        let mut removed = 0;
        for entry in Walker::new(&self.options.root).walk()? {
            let is_db = entry.path.extension().map(|e| e == "db").unwrap_or(false);
            if !is_db || entry.mtime >= cutoff {
                continue;
            }
            match std::fs::remove_file(&entry.path) {
                Ok(()) => {
                    debug!(path = ?entry.path, "Removed expired database");
                    removed += 1;
                }
                Err(e) => warn!(path = ?entry.path, error = %e, "Failed to remove expired database"),
            }
        }

        let mut index = self.load_index();
        let before = index.len();
        index.retain(|_, fp| self.db_path_for(fp).is_file());
        if index.len() != before {
            self.save_index(&index)?;
        }

        info!(
            removed,
            pruned = before - index.len(),
            retention_secs = self.options.retention.as_secs(),
            "Expired code knowledge graphs"
        );
        Ok(removed)
    }

    /// Builds performed by this cache.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Database file for `fingerprint`.
    pub fn db_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.db_path_for(&fingerprint.to_string())
    }

    /// Fingerprint `codebase` with this cache's probe timeouts.
    pub fn fingerprint(&self, codebase: &Path) -> Result<Fingerprint, IndexerError> {
        self.fingerprinter.fingerprint(&resolve(codebase)?)
    }

    fn db_path_for(&self, fingerprint: &str) -> PathBuf {
        self.options.root.join(format!("{}.db", fingerprint))
    }

    fn open_with(&self, codebase: &Path, force: bool) -> Result<OpenedStore, IndexerError> {
        let root = resolve(codebase)?;
        std::fs::create_dir_all(&self.options.root)?;

        let fingerprint = self.fingerprinter.fingerprint(&root)?;
        let current = fingerprint.to_string();
        let key = codebase_key(&root);
        let db_path = self.db_path_for(&current);
        let mut index = self.load_index();

        if !force && index.get(&key) == Some(&current) && db_path.is_file() {
            debug!(path = %key, fingerprint = %current, "Reusing code knowledge graph");
            let store = CkgStore::open(&db_path)?;
            return Ok(OpenedStore {
                store,
                fingerprint,
                outcome: OpenOutcome::Reused,
                db_path,
            });
        }

        if let Some(previous) = index.get(&key).filter(|fp| **fp != current) {
            let shared = index.iter().any(|(k, fp)| *k != key && fp == previous);
            if !shared {
                debug!(path = %key, fingerprint = %previous, "Removing stale database");
                remove_if_exists(&self.db_path_for(previous))?;
            }
        }
        remove_if_exists(&db_path)?;

        info!(path = %key, fingerprint = %current, "Building code knowledge graph");
        let (store, stats) = match self.build(&root, &db_path) {
            Ok(built) => built,
            Err(e) => {
                warn!(path = %key, error = %e, "Build failed, discarding partial database");
                let _ = std::fs::remove_file(&db_path);
                return Err(e);
            }
        };
        self.builds.fetch_add(1, Ordering::Relaxed);

        // The database now holds only this tree; other paths on the same fingerprint must rebuild
        let before = index.len();
        index.retain(|k, fp| *k == key || *fp != current);
        if index.len() < before {
            debug!(fingerprint = %current, evicted = before - index.len(), "Evicted paths sharing fingerprint");
        }
        index.insert(key, current);
        self.save_index(&index)?;

        Ok(OpenedStore {
            store,
            fingerprint,
            outcome: OpenOutcome::Built(stats),
            db_path,
        })
    }

    fn build(&self, root: &Path, db_path: &Path) -> Result<(CkgStore, BuildStats), IndexerError> {
        let mut store = CkgStore::open(db_path)?;
        store.create_tables()?;
        let stats = self.builder.build(root, &mut store)?;
        Ok((store, stats))
    }

    fn load_index(&self) -> PathIndex {
        let path = self.options.root.join(INDEX_FILE);
        if !path.exists() {
            return PathIndex::new();
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(index) => index,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Failed to parse storage index, starting empty");
                    PathIndex::new()
                }
            },
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read storage index, starting empty");
                PathIndex::new()
            }
        }
    }

    fn save_index(&self, index: &PathIndex) -> Result<(), IndexerError> {
        std::fs::create_dir_all(&self.options.root)?;
        let json = serde_json::to_string_pretty(index)?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.options.root.join(format!(".{}.tmp", INDEX_FILE));
        std::fs::write(&temp_path, &json)?;
        std::fs::rename(&temp_path, self.options.root.join(INDEX_FILE))?;

        debug!(entries = index.len(), "Saved storage index");
        Ok(())
    }
}

fn resolve(codebase: &Path) -> Result<PathBuf, IndexerError> {
    let root = codebase
        .canonicalize()
        .map_err(|_| IndexerError::NotFound(codebase.to_path_buf()))?;
    if !root.is_dir() {
        return Err(IndexerError::NotFound(root));
    }
    Ok(root)
}

fn codebase_key(root: &Path) -> String {
    root.to_string_lossy().into_owned()
}

fn remove_if_exists(path: &Path) -> Result<(), IndexerError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
