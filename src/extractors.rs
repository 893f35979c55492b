//! Request data extraction utilities.
//!
//! The node's routes are fixed-shape, so the only extraction this crate
//! needs is the path parameters the router stores per request; see
//! [`params`].

/// Path parameter extraction from dynamic route segments.
pub mod params;
