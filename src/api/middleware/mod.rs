//! API middleware components

pub mod http_cache;
pub mod logging;
pub mod metrics;
pub mod security;

use axum::{body::Body, extract::MatchedPath, http::Request};

pub use http_cache::{CacheDirectives, CacheStrategy, HttpCacheLayer, Visibility, http_cache};
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use security::security_headers_middleware;

/// Route template when matched, raw path otherwise (keeps label cardinality bounded)
fn matched_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}
