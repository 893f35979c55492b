//! HTTP route definition and path matching functionality.
//!
//! This module provides the core `Route` struct for defining HTTP routes with path patterns
//! and parameter extraction. Routes can contain dynamic segments like `{id}` that are
//! captured as parameters.
//!
//! # Examples
//!
//! ```rust
//! use athome::route::Route;
//! use athome::handler::BoxHandler;
//! use athome::types::Request;
//! use http::Method;
//!
//! async fn handler(_req: Request) -> &'static str {
//!     "Hello, World!"
//! }
//!
//! let route = Route::new(
//!     "/users/{id}".to_string(),
//!     Method::GET,
//!     BoxHandler::new(handler),
//!     None
//! );
//!
//! let params = route.match_path("/users/123").unwrap();
//! assert_eq!(params.get("id"), Some(&"123".to_string()));
//! ```

use std::collections::HashMap;

use http::Method;

use crate::handler::BoxHandler;

/// HTTP route with path pattern matching.
pub struct Route {
    /// Original path string used to create this route.
    pub path: String,
    /// HTTP method this route responds to.
    pub method: Method,
    /// Handler function to execute when route is matched.
    pub handler: BoxHandler,
    /// Whether trailing slash redirection is enabled.
    pub tsr: bool,
}

impl Route {
    /// Creates a new route with the specified path, method, and handler.
    pub fn new(path: String, method: Method, handler: BoxHandler, tsr: Option<bool>) -> Self {
        Self {
            path,
            method,
            handler,
            tsr: tsr.unwrap_or(false),
        }
    }

    /// Matches a request path against this route's pattern, extracting named segments.
    ///
    /// Supports literal segments, `{name}` single-segment captures, and a trailing
    /// `{*name}` segment that greedily captures the remainder of the path. Returns
    /// `None` if the path does not match the pattern's shape.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let pattern_segments: Vec<&str> = self.path.trim_matches('/').split('/').collect();
        let path_segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        let mut params = HashMap::new();
        let mut pat_iter = pattern_segments.iter().enumerate();

        for (i, pat_seg) in &mut pat_iter {
            if let Some(name) = pat_seg.strip_prefix("{*").and_then(|s| s.strip_suffix('}')) {
                let rest = path_segments.get(i..)?.join("/");
                params.insert(name.to_string(), rest);
                return Some(params);
            }

            let path_seg = path_segments.get(i)?;

            if let Some(name) = pat_seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                params.insert(name.to_string(), (*path_seg).to_string());
            } else if pat_seg != path_seg {
                return None;
            }
        }

        if path_segments.len() != pattern_segments.len() {
            return None;
        }

        Some(params)
    }
}
