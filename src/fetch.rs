//! Upstream origin fetching: issues the request, validates the response
//! head, and tees the body to the client while accumulating it for cache
//! admission.
//!
//! Bytes reach the client before the cache is ever touched — cache
//! admission is a side effect of orderly stream completion, never a
//! precondition for delivering bytes.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, stream};
use reqwest::StatusCode;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::cache::{Cache, CacheEntry};
use crate::error::FetchError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_IDLE_PER_HOST: usize = 100;
const MAX_CONCURRENT: usize = 1000;
const MAX_CONNECT_ATTEMPTS: u32 = 3;

/// Origin response headers worth replaying, captured before any body bytes
/// are read.
#[derive(Debug, Clone)]
pub struct UpstreamHead {
    pub content_type: String,
    pub content_length: Option<String>,
    pub last_modified: Option<String>,
}

/// A `reqwest::Client` configured for talking to the origin: TLS
/// verification disabled (the origin is a trusted peer presenting rotating
/// self-signed material), long connect timeout, and a concurrency cap that
/// mirrors the source's connection pool limits.
pub struct FetchClient {
    inner: reqwest::Client,
    concurrency: Semaphore,
}

impl FetchClient {
    pub fn new() -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .build()
            .map_err(FetchError::Transport)?;

        Ok(Self {
            inner,
            concurrency: Semaphore::new(MAX_CONCURRENT),
        })
    }

    /// Issues the request, retrying connection establishment up to
    /// [`MAX_CONNECT_ATTEMPTS`] times. Once a response is received, no
    /// further retries happen regardless of status.
    async fn send(&self, image_url: &str) -> Result<reqwest::Response, FetchError> {
        let _permit = self
            .concurrency
            .acquire()
            .await
            .expect("semaphore is never closed");

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.inner.get(image_url).send().await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < MAX_CONNECT_ATTEMPTS && err.is_connect() => continue,
                Err(err) => return Err(FetchError::Transport(err)),
            }
        }
    }

    /// Performs the full fetch protocol: connect (with retry), validate the
    /// response head, then return a stream that tees each chunk to the
    /// caller and hands the assembled body to the cache on orderly
    /// completion.
    pub async fn fetch(
        &self,
        cache: Arc<Cache>,
        fingerprint: String,
        image_url: String,
    ) -> Result<(UpstreamHead, impl Stream<Item = Result<Bytes, FetchError>> + use<>), FetchError> {
        let response = self.send(&image_url).await?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::BadStatus(response.status()));
        }

        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(FetchError::MissingContentType)?;
        let content_length = response
            .headers()
            .get(http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let last_modified = response
            .headers()
            .get(http::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let head = UpstreamHead {
            content_type,
            content_length,
            last_modified,
        };

        let capacity = head
            .content_length
            .as_deref()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);

        let state = TeeState {
            response,
            buffer: Vec::with_capacity(capacity),
            head: head.clone(),
            cache,
            fingerprint,
            aborted: false,
        };

        let stream = stream::unfold(state, move |mut state| async move {
            if state.aborted {
                return None;
            }

            match state.response.chunk().await {
                Ok(Some(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                    Some((Ok(chunk), state))
                }
                Ok(None) => {
                    let entry = CacheEntry {
                        body: Bytes::from(std::mem::take(&mut state.buffer)),
                        content_type: state.head.content_type.clone(),
                        content_length: state.head.content_length.clone(),
                        last_modified: state.head.last_modified.clone(),
                    };
                    let fingerprint = state.fingerprint.clone();
                    state.cache.put(&fingerprint, entry).await;
                    None
                }
                Err(err) => {
                    warn!(
                        fingerprint = state.fingerprint,
                        %err,
                        "upstream body read failed mid-stream, cache not populated"
                    );
                    state.aborted = true;
                    Some((Err(FetchError::Transport(err)), state))
                }
            }
        });

        Ok((head, stream))
    }
}

struct TeeState {
    response: reqwest::Response,
    buffer: Vec<u8>,
    head: UpstreamHead,
    cache: Arc<Cache>,
    fingerprint: String,
    aborted: bool,
}
