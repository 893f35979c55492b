//! Request dispatch: validates the URL, serves from cache, or falls
//! through to an upstream fetch.
//!
//! Registered three times under the three accepted route shapes (see
//! [`crate::lifecycle`]), all funnelling into [`dispatch`].

use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use futures_util::TryStreamExt;
use http::{StatusCode, header};
use regex::Regex;
use tracing::{debug, info};

use crate::body::TakoBody;
use crate::cache::Cache;
use crate::extractors::params::PathParams;
use crate::fetch::FetchClient;
use crate::fingerprint::RequestKey;
use crate::node::NodeState;
use crate::singleflight::SingleFlight;
use crate::types::{Request, Response};

const SERVER_HEADER: &str = "Mangadex@Home Node 1.0.0 (13)";

static CHAPTER_REFERER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://mangadex\.org/chapter/[0-9]+").expect("referer pattern is valid")
});

/// Everything a dispatched request needs, shared by `Arc` across every
/// connection.
pub struct DispatcherContext {
    pub cache: Arc<Cache>,
    pub single_flight: Arc<SingleFlight>,
    pub fetch_client: Arc<FetchClient>,
    pub node: Arc<NodeState>,
}

pub async fn dispatch(ctx: Arc<DispatcherContext>, req: Request) -> Response {
    let started_at = Instant::now();
    let now_unix_ms = unix_millis();
    ctx.node.touch_last_request(now_unix_ms);

    let peer = req.extensions().get::<SocketAddr>().copied();
    let referer = extract_chapter_referer(&req);

    let Some(key) = extract_request_key(&req) else {
        debug!(
            uri = %req.uri(),
            peer = ?peer,
            "rejected request: invalid image path"
        );
        return bare_status(StatusCode::BAD_REQUEST);
    };

    let sanitized_url = key.sanitized_url();

    if req.headers().contains_key(header::IF_MODIFIED_SINCE) {
        info!(
            sanitized_url,
            peer = ?peer,
            referer,
            outcome = "not-modified",
            "request served"
        );
        return default_headers(http::Response::builder().status(StatusCode::NOT_MODIFIED))
            .body(TakoBody::empty())
            .expect("static response is well-formed");
    }

    let fingerprint = key.fingerprint();

    if let Some(entry) = ctx.cache.get(&fingerprint).await {
        info!(
            sanitized_url,
            peer = ?peer,
            referer,
            outcome = "hit",
            "request served"
        );
        return hit_response(entry, &sanitized_url, started_at);
    }

    let origin = ctx.node.origin();
    let image_url = format!("{}{}", origin.origin_url, sanitized_url);

    match fetch_with_coalescing(&ctx, &fingerprint, &image_url, &sanitized_url, started_at).await {
        Some(response) => {
            info!(
                sanitized_url,
                peer = ?peer,
                referer,
                outcome = "miss",
                "request served"
            );
            response
        }
        None => {
            info!(
                sanitized_url,
                peer = ?peer,
                referer,
                outcome = "fetch-failed",
                "request served"
            );
            default_headers(http::Response::builder().status(StatusCode::FOUND))
                .header(header::LOCATION, image_url)
                .body(TakoBody::empty())
                .expect("redirect response is well-formed")
        }
    }
}

/// Drives single-flight coalescing: becomes owner and fetches, or waits for
/// the current owner and re-checks the cache. Returns `None` only once a
/// fetch attempt has genuinely failed (this caller's own, or the owner's
/// with the entry still absent afterward).
async fn fetch_with_coalescing(
    ctx: &DispatcherContext,
    fingerprint: &str,
    image_url: &str,
    sanitized_url: &str,
    started_at: Instant,
) -> Option<Response> {
    // At most one follower hand-off: if the owner we waited on left the
    // entry absent, we try once to become owner ourselves rather than
    // looping forever against a persistently failing origin.
    for _ in 0..2 {
        match ctx.single_flight.try_acquire(fingerprint) {
            Some(_guard) => {
                return match ctx
                    .fetch_client
                    .fetch(ctx.cache.clone(), fingerprint.to_string(), image_url.to_string())
                    .await
                {
                    Ok((head, stream)) => {
                        let content_length = head.content_length.clone();
                        let last_modified = head.last_modified.clone();
                        let body_stream = stream.map_err(std::io::Error::other);
                        let mut builder = default_headers(http::Response::builder().status(StatusCode::OK))
                            .header(header::CONTENT_TYPE, head.content_type)
                            .header("X-Cache", "MISS")
                            .header("X-Uri", sanitized_url.to_string())
                            .header(
                                "X-Time-Taken",
                                started_at.elapsed().as_millis().to_string(),
                            );
                        if let Some(len) = content_length {
                            builder = builder.header(header::CONTENT_LENGTH, len);
                        }
                        if let Some(modified) = last_modified {
                            builder = builder.header(header::LAST_MODIFIED, modified);
                        }
                        Some(
                            builder
                                .body(TakoBody::from_stream(body_stream))
                                .expect("streamed response is well-formed"),
                        )
                    }
                    Err(_err) => None,
                };
            }
            None => {
                ctx.single_flight.wait(fingerprint).await;
                if let Some(entry) = ctx.cache.get(fingerprint).await {
                    return Some(hit_response(entry, sanitized_url, started_at));
                }
            }
        }
    }
    None
}

fn hit_response(entry: crate::cache::CacheEntry, sanitized_url: &str, started_at: Instant) -> Response {
    let content_length = entry
        .content_length
        .clone()
        .unwrap_or_else(|| entry.body.len().to_string());

    let mut builder = default_headers(http::Response::builder().status(StatusCode::OK))
        .header(header::CONTENT_TYPE, entry.content_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header("X-Cache", "HIT")
        .header("X-Uri", sanitized_url.to_string())
        .header(
            "X-Time-Taken",
            started_at.elapsed().as_millis().to_string(),
        );

    if let Some(last_modified) = entry.last_modified {
        builder = builder.header(header::LAST_MODIFIED, last_modified);
    }

    builder
        .body(TakoBody::from(entry.body))
        .expect("cached response is well-formed")
}

fn default_headers(builder: http::response::Builder) -> http::response::Builder {
    builder
        .header(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            "https://mangadex.org",
        )
        .header("Access-Control-Expose-Headers", "*")
        .header(header::CACHE_CONTROL, "public, max-age=1209600")
        .header(header::SERVER, SERVER_HEADER)
        .header("Timing-Allow-Origin", "https://mangadex.org")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
}

fn bare_status(status: StatusCode) -> Response {
    http::Response::builder()
        .status(status)
        .body(TakoBody::empty())
        .expect("status-only response is well-formed")
}

fn extract_request_key(req: &Request) -> Option<RequestKey> {
    let params = req.extensions().get::<PathParams>()?;
    let image_class = params.0.get("image_class")?;
    let chapter_id = params.0.get("chapter_id")?;
    let image_name = params.0.get("image_name")?;
    RequestKey::parse(image_class, chapter_id, image_name)
}

fn extract_chapter_referer(req: &Request) -> Option<String> {
    let referer = req.headers().get(header::REFERER)?.to_str().ok()?;
    CHAPTER_REFERER
        .find(referer)
        .map(|m| m.as_str().to_string())
}

fn unix_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
