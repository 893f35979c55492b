//! Typed error taxonomy bridging I/O, HTTP, and JSON failures.
//!
//! Each subsystem that talks to the outside world (configuration files, the
//! on-disk cache, the origin, the control plane) gets its own error enum so
//! callers can match on failure kind without string-sniffing. Framework-level
//! plumbing (response/body construction) keeps using the boxed
//! `std::error::Error` convention already established by [`crate::types::BoxError`].

use thiserror::Error;

/// Failures from loading or parsing the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures from the on-disk content cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures from fetching an image from the upstream origin.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream responded with status {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("upstream response missing Content-Type")]
    MissingContentType,
}

/// Failures talking to the control plane.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control-plane transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("control-plane response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("could not read settings before heartbeat: {0}")]
    Settings(#[from] ConfigError),
}
