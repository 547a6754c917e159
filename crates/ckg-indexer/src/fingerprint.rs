//! Snapshot fingerprints for source trees.
//!
//! Inside a git work tree the fingerprint is derived from `HEAD` and the
//! porcelain status; everywhere else it is an md5 over file names,
//! modification times and sizes. Any git failure falls back to the
//! metadata strategy.

use crate::scanner::Walker;
use crate::IndexerError;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Timeouts for the git probes.
#[derive(Debug, Clone)]
pub struct FingerprintOptions {
    /// Limit for `git rev-parse` calls
    pub probe_timeout: Duration,
    /// Limit for `git status --porcelain`
    pub status_timeout: Duration,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
            status_timeout: Duration::from_secs(10),
        }
    }
}

/// Identifier for the current state of a directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// Clean work tree at `commit`
    GitClean { commit: String },
    /// Work tree at `commit` with uncommitted changes
    GitDirty { commit: String, status_digest: String },
    /// md5 over file metadata
    Metadata { digest: String },
}

impl Fingerprint {
    pub fn is_git(&self) -> bool {
        !matches!(self, Fingerprint::Metadata { .. })
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::GitClean { commit } => write!(f, "git-clean-{}", commit),
            Fingerprint::GitDirty {
                commit,
                status_digest,
            } => write!(f, "git-dirty-{}-{}", commit, status_digest),
            Fingerprint::Metadata { digest } => write!(f, "metadata-{}", digest),
        }
    }
}

/// Computes fingerprints with configurable probe timeouts.
#[derive(Debug, Clone, Default)]
pub struct Fingerprinter {
    options: FingerprintOptions,
}

impl Fingerprinter {
    pub fn new(options: FingerprintOptions) -> Self {
        Self { options }
    }

    /// Fingerprint `dir`, preferring git when it is a work tree.
    pub fn fingerprint(&self, dir: &Path) -> Result<Fingerprint, IndexerError> {
        match self.git_fingerprint(dir) {
            Some(fp) => Ok(fp),
            None => metadata_fingerprint(dir),
        }
    }

    fn git_fingerprint(&self, dir: &Path) -> Option<Fingerprint> {
        let inside = run_git(dir, &["rev-parse", "--is-inside-work-tree"], self.options.probe_timeout)?;
        if inside.trim() != "true" {
            return None;
        }

        let status = run_git(dir, &["status", "--porcelain"], self.options.status_timeout)?;
        let commit = run_git(dir, &["rev-parse", "HEAD"], self.options.probe_timeout)?;
        let commit = commit.trim().to_string();
        if commit.is_empty() {
            debug!(path = ?dir, "Empty commit from git, using metadata fingerprint");
            return None;
        }

        if status.trim().is_empty() {
            return Some(Fingerprint::GitClean { commit });
        }
        let digest = format!("{:x}", md5::compute(status.as_bytes()));
        Some(Fingerprint::GitDirty {
            commit,
            status_digest: digest[..8].to_string(),
        })
    }
}

/// Fingerprint `dir` with default probe timeouts.
pub fn fingerprint(dir: &Path) -> Result<Fingerprint, IndexerError> {
    Fingerprinter::default().fingerprint(dir)
}

/// md5 over name, mtime and size of every non-hidden file, in walk order.
pub fn metadata_fingerprint(dir: &Path) -> Result<Fingerprint, IndexerError> {
    let mut context = md5::Context::new();
    for entry in Walker::new(dir).walk()? {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        context.consume(name.as_bytes());
        context.consume(format_mtime(entry.mtime).as_bytes());
        context.consume(entry.size.to_string().as_bytes());
    }
    Ok(Fingerprint::Metadata {
        digest: format!("{:x}", context.compute()),
    })
}

/// Seconds as a decimal string, always with a fractional part.
fn format_mtime(mtime: f64) -> String {
    let s = mtime.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Run `git args` in `dir`, returning stdout on success within `timeout`.
fn run_git(dir: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    let mut child = match Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            debug!(error = %e, "git unavailable, using metadata fingerprint");
            return None;
        }
    };

    // Drain stdout concurrently so a large status cannot fill the pipe
    let reader = child.stdout.take().map(|mut stdout| {
        std::thread::spawn(move || {
            let mut out = String::new();
            stdout.read_to_string(&mut out).map(|_| out)
        })
    });

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            debug!(args = ?args, timeout_secs = timeout.as_secs(), "git probe timed out");
            return None;
        }
        Err(e) => {
            debug!(args = ?args, error = %e, "git probe failed");
            return None;
        }
    };

    let output = match reader.map(|handle| handle.join()) {
        Some(Ok(Ok(out))) => out,
        _ => {
            debug!(args = ?args, "git output unreadable");
            return None;
        }
    };

    if !status.success() {
        debug!(args = ?args, code = ?status.code(), "git probe exited with failure");
        return None;
    }
    Some(output)
}
