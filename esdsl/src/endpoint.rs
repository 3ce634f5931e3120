//! Routing information shared by every request type
//!
//! The DSL does not speak HTTP. Each request describes its method, path
//! segments and query parameters, and the client turns that into a URL.
//! Path segments are raw values; escaping is the transport's job.

use std::fmt;

/// HTTP method used by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that knows where it goes.
pub trait Endpoint {
    fn method(&self) -> Method;

    /// Unescaped path segments, e.g. `["logs", "_doc", "1"]`.
    fn path_segments(&self) -> Vec<String>;

    /// Query string parameters, in order.
    fn query_params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Short name used in logs and metrics labels.
    fn name(&self) -> &'static str;
}

/// Comma-joins index names, `None` when the list is empty.
///
/// A missing index segment means "all indices" for every endpoint that
/// accepts a list.
pub(crate) fn join_indices(indices: &[String]) -> Option<String> {
    if indices.is_empty() {
        None
    } else {
        Some(indices.join(","))
    }
}
