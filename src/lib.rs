//! A MangaDex@Home-compatible CDN edge node: a TLS-terminating HTTP server
//! that fronts the MangaDex image origin, caches responses on disk, and
//! reports its health to a control plane over a periodic heartbeat.
//!
//! # Compatibility
//! - Runtime: `tokio`
//! - HTTP: `hyper` 1.x
//!
//! # Key concepts
//! - [router::Router] manages routes and dispatch.
//! - [dispatcher] implements the node's request-handling contract: cache
//!   lookup, conditional requests, and upstream fallback.
//! - [cache] is the bounded, disk-backed, content-addressed body store.
//! - [control] runs the heartbeat protocol that keeps [node::NodeState]
//!   current.
//! - [lifecycle] sequences startup and graceful shutdown.

/// HTTP request and response body handling utilities.
pub mod body;

/// The bounded, disk-backed, content-addressed cache.
pub mod cache;

/// Configuration loading and the re-readable settings snapshot.
pub mod config;

/// Control-plane heartbeat client.
pub mod control;

/// Request dispatch: cache lookup, conditional requests, upstream fallback.
pub mod dispatcher;

/// Typed error taxonomy for config, cache, fetch, and control-plane failures.
pub mod error;

/// Request data extraction utilities for path parameters.
pub mod extractors;

/// Upstream origin fetching.
pub mod fetch;

/// Request key derivation and validation.
pub mod fingerprint;

/// Request handler traits and implementations.
pub mod handler;

/// Startup and graceful-shutdown sequencing.
pub mod lifecycle;

/// Process-wide node state, shared explicitly via `Arc`.
pub mod node;

/// Response generation utilities and traits.
pub mod responder;

/// Route definition and matching logic.
pub mod route;

/// Request routing and dispatch functionality.
pub mod router;

/// Coalesces concurrent upstream fetches for the same fingerprint.
pub mod singleflight;

/// Tracing subscriber setup.
pub mod tracing;

/// Core type definitions used throughout the framework.
pub mod types;

pub use bytes::Bytes;
pub use http::{Method, StatusCode, header};
pub use http_body_util::Full;

/// TLS/SSL server implementation for secure connections.
pub mod server_tls;

pub use server_tls::serve_tls;
