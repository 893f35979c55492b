//! Path parameters extracted from dynamic route segments.
//!
//! The router stores matched `{name}` segments in request extensions as a
//! [`PathParams`]; [`crate::dispatcher`] reads them directly by name rather
//! than through a typed extractor, since the request key (image class,
//! chapter id, image name) is always the same fixed shape.

use std::collections::HashMap;

#[derive(Clone, Default)]
pub(crate) struct PathParams(pub HashMap<String, String>);
