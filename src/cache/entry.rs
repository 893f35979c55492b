//! The cached value tuple and its in-memory LRU metadata.

use bytes::Bytes;

/// A fully-assembled cached response body plus the origin headers worth
/// replaying. Never observable in a partially-written state.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub body: Bytes,
    pub content_type: String,
    pub content_length: Option<String>,
    pub last_modified: Option<String>,
}

/// What the in-memory index keeps per fingerprint; the body itself lives on
/// disk and is read back lazily on `get`.
#[derive(Debug, Clone)]
pub(super) struct CacheMeta {
    pub content_type: String,
    pub content_length: Option<String>,
    pub last_modified: Option<String>,
    pub size_bytes: u64,
}
