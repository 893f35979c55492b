//! Settings loading and the re-readable snapshot accessor.
//!
//! The node is configured by a single flat JSON document, mirroring the
//! source implementation's `settings.json`. [`SettingsSource`] abstracts
//! "get the current settings snapshot" so the heartbeat loop's requirement
//! to re-read before every tick is satisfiable by test doubles as well as
//! the real file-backed loader.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Current build/protocol version this node reports to the control plane.
pub const BUILD_VERSION: u32 = 13;

/// Flat settings document, deserialized wholesale on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub client_secret: String,
    pub client_port: u16,
    pub max_cache_size_bytes: u64,
    pub reported_disk_space_bytes: u64,
    pub reported_network_speed_bytes_per_sec: u64,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_control_url")]
    pub control_url: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_tls_cert_path")]
    pub tls_cert_path: PathBuf,
    #[serde(default = "default_tls_key_path")]
    pub tls_key_path: PathBuf,
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_worker_count() -> usize {
    4
}

fn default_control_url() -> String {
    "https://api.mangadex.network".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_tls_cert_path() -> PathBuf {
    PathBuf::from("server.crt")
}

fn default_tls_key_path() -> PathBuf {
    PathBuf::from("server.key")
}

impl Settings {
    /// Parses a settings document from its on-disk JSON representation.
    pub fn from_json(bytes: &[u8], path: &str) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

/// Abstraction over "get the current settings snapshot," re-readable on demand.
///
/// The control-plane heartbeat loop re-reads settings before every tick so
/// edits made to the backing file after startup (disk space, network speed,
/// port) propagate without a restart.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn current(&self) -> Result<Settings, ConfigError>;
}

/// Default [`SettingsSource`]: re-reads and re-parses the settings file from
/// disk on every call. Deliberately uncached — the whole point is to observe
/// edits made after startup.
pub struct FileSettingsSource {
    path: PathBuf,
}

impl FileSettingsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the settings file synchronously, for use before the async
    /// runtime exists (its worker-thread count is itself a config value).
    pub fn load_sync(path: &Path) -> Result<Settings, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Settings::from_json(&bytes, &path.display().to_string())
    }
}

#[async_trait]
impl SettingsSource for FileSettingsSource {
    async fn current(&self) -> Result<Settings, ConfigError> {
        let bytes =
            tokio::fs::read(&self.path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: self.path.display().to_string(),
                    source,
                })?;
        Settings::from_json(&bytes, &self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document_with_defaults() {
        let json = br#"{
            "client_secret": "s3cr3t",
            "client_port": 443,
            "max_cache_size_bytes": 1073741824,
            "reported_disk_space_bytes": 2147483648,
            "reported_network_speed_bytes_per_sec": 125000000
        }"#;
        let settings = Settings::from_json(json, "test.json").unwrap();
        assert_eq!(settings.client_port, 443);
        assert_eq!(settings.worker_count, 4);
        assert_eq!(settings.control_url, "https://api.mangadex.network");
    }

    #[test]
    fn rejects_malformed_document() {
        let err = Settings::from_json(b"not json", "test.json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
