//! Configuration for CKG.

use crate::CoreError;
use ckg_indexer::{CacheOptions, FingerprintOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CKG configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CkgConfig {
    /// Data directory; databases live under `<data_dir>/ckg`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Age in seconds after which databases expire (default: 7 days)
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Maximum report length in characters before clipping
    #[serde(default = "default_max_response_len")]
    pub max_response_len: usize,

    /// Maximum stores kept open by the query tool
    #[serde(default = "default_max_open_stores")]
    pub max_open_stores: usize,

    /// Expire old databases when the query tool starts
    #[serde(default = "default_expire_on_start")]
    pub expire_on_start: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Git probe settings
    #[serde(default)]
    pub git: GitConfig,
}

/// Git probe timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Timeout for `git rev-parse` probes
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Timeout for `git status --porcelain`
    #[serde(default = "default_status_timeout_secs")]
    pub status_timeout_secs: u64,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ckg")
}

fn default_retention_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_max_response_len() -> usize {
    16000
}

fn default_max_open_stores() -> usize {
    8
}

fn default_expire_on_start() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_status_timeout_secs() -> u64 {
    10
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout_secs(),
            status_timeout_secs: default_status_timeout_secs(),
        }
    }
}

impl Default for CkgConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            retention_secs: default_retention_secs(),
            max_response_len: default_max_response_len(),
            max_open_stores: default_max_open_stores(),
            expire_on_start: default_expire_on_start(),
            log_level: default_log_level(),
            git: GitConfig::default(),
        }
    }
}

impl CkgConfig {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Self {
        let config_path = default_data_dir().join("config.yaml");

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_yaml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(path = ?config_path, error = %e, "Failed to parse config file");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = ?config_path, error = %e, "Failed to read config file");
                }
            }
        }

        Self::default()
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Directory holding the fingerprinted databases and path index
    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("ckg")
    }

    /// Ensure data directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.storage_dir())?;
        Ok(())
    }

    /// Cache options derived from this configuration
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            root: self.storage_dir(),
            retention: Duration::from_secs(self.retention_secs),
            fingerprint: FingerprintOptions {
                probe_timeout: Duration::from_secs(self.git.probe_timeout_secs),
                status_timeout: Duration::from_secs(self.git.status_timeout_secs),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = CkgConfig::default();
        assert_eq!(config.retention_secs, 604800);
        assert_eq!(config.max_response_len, 16000);
        assert_eq!(config.max_open_stores, 8);
        assert!(config.expire_on_start);
        assert_eq!(config.git.probe_timeout_secs, 5);
        assert_eq!(config.git.status_timeout_secs, 10);
        assert!(config.data_dir.ends_with(".ckg"));
        assert!(config.storage_dir().ends_with(".ckg/ckg"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "data_dir: /var/lib/ckg\nmax_response_len: 500\ngit:\n  status_timeout_secs: 2\n",
        )
        .unwrap();

        let config = CkgConfig::load_from(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/ckg"));
        assert_eq!(config.max_response_len, 500);
        assert_eq!(config.git.status_timeout_secs, 2);
        assert_eq!(config.git.probe_timeout_secs, 5);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "max_response_len: [not, a, number]\n").unwrap();
        assert!(matches!(
            CkgConfig::load_from(&path),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_cache_options() {
        let config = CkgConfig {
            data_dir: PathBuf::from("/data"),
            retention_secs: 60,
            ..Default::default()
        };
        let options = config.cache_options();
        assert_eq!(options.root, PathBuf::from("/data/ckg"));
        assert_eq!(options.retention, Duration::from_secs(60));
        assert_eq!(options.fingerprint.status_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempdir().unwrap();
        let config = CkgConfig {
            data_dir: dir.path().join("data"),
            ..Default::default()
        };
        config.ensure_dirs().unwrap();
        assert!(config.storage_dir().is_dir());
    }
}
