//! Response caching headers: weak ETags, conditional GETs and Cache-Control
//!
//! Attach per route with `route_layer(http_cache(CacheStrategy::MediumLived))`.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::Hasher;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Responses larger than this are passed through without an ETag
pub const MAX_ETAG_BODY_BYTES: usize = 1024 * 1024;

/// Who may store a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// A complete set of caching directives for one route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirectives {
    pub visibility: Visibility,
    pub max_age: Duration,
    /// Lifetime in shared caches, when it differs from `max_age`
    pub s_maxage: Option<Duration>,
    pub stale_while_revalidate: Option<Duration>,
    pub must_revalidate: bool,
    /// Forbid storage entirely; the other fields are ignored
    pub no_store: bool,
    /// Whether responses get a content validator
    pub etag: bool,
}

impl CacheDirectives {
    /// Public directives with the given max-age and ETags enabled
    pub fn public(max_age: Duration) -> Self {
        Self {
            visibility: Visibility::Public,
            max_age,
            s_maxage: None,
            stale_while_revalidate: None,
            must_revalidate: false,
            no_store: false,
            etag: true,
        }
    }

    /// Private directives with the given max-age and ETags enabled
    pub fn private(max_age: Duration) -> Self {
        Self {
            visibility: Visibility::Private,
            ..Self::public(max_age)
        }
    }

    /// Directives that forbid any storage and skip validators
    pub fn no_store() -> Self {
        Self {
            no_store: true,
            must_revalidate: true,
            etag: false,
            ..Self::private(Duration::ZERO)
        }
    }

    pub fn with_s_maxage(mut self, s_maxage: Duration) -> Self {
        self.s_maxage = Some(s_maxage);
        self
    }

    pub fn with_stale_while_revalidate(mut self, window: Duration) -> Self {
        self.stale_while_revalidate = Some(window);
        self
    }

    pub fn with_must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    pub fn without_etag(mut self) -> Self {
        self.etag = false;
        self
    }

    /// Render as a `Cache-Control` value
    pub fn header_value(&self) -> String {
        if self.no_store {
            return "no-store, no-cache, must-revalidate".to_string();
        }

        let mut parts = vec![
            self.visibility.as_str().to_string(),
            format!("max-age={}", self.max_age.as_secs()),
        ];
        if let Some(s_maxage) = self.s_maxage {
            parts.push(format!("s-maxage={}", s_maxage.as_secs()));
        }
        if let Some(window) = self.stale_while_revalidate {
            parts.push(format!("stale-while-revalidate={}", window.as_secs()));
        }
        if self.must_revalidate {
            parts.push("must-revalidate".to_string());
        }
        parts.join(", ")
    }
}

/// Named caching policies selectable per route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStrategy {
    /// Never stored, no validator
    NoCache,
    /// 5 minutes, public
    ShortLived,
    /// 1 hour, public, 10 minutes stale-while-revalidate
    MediumLived,
    /// 24 hours, public, 1 hour stale-while-revalidate
    LongLived,
    /// 1 minute, private, must-revalidate
    ApiCache,
    Custom(CacheDirectives),
}

impl CacheStrategy {
    pub fn directives(&self) -> CacheDirectives {
        match self {
            CacheStrategy::NoCache => CacheDirectives::no_store(),
            CacheStrategy::ShortLived => CacheDirectives::public(Duration::from_secs(300)),
            CacheStrategy::MediumLived => CacheDirectives::public(Duration::from_secs(3600))
                .with_stale_while_revalidate(Duration::from_secs(600)),
            CacheStrategy::LongLived => CacheDirectives::public(Duration::from_secs(86_400))
                .with_stale_while_revalidate(Duration::from_secs(3600)),
            CacheStrategy::ApiCache => {
                CacheDirectives::private(Duration::from_secs(60)).with_must_revalidate()
            }
            CacheStrategy::Custom(directives) => directives.clone(),
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStrategy::NoCache => write!(f, "no_cache"),
            CacheStrategy::ShortLived => write!(f, "short_lived"),
            CacheStrategy::MediumLived => write!(f, "medium_lived"),
            CacheStrategy::LongLived => write!(f, "long_lived"),
            CacheStrategy::ApiCache => write!(f, "api_cache"),
            CacheStrategy::Custom(_) => write!(f, "custom"),
        }
    }
}

/// Build the caching layer for a strategy
pub fn http_cache(strategy: CacheStrategy) -> HttpCacheLayer {
    HttpCacheLayer::new(strategy)
}

#[derive(Debug, Clone)]
pub struct HttpCacheLayer {
    directives: CacheDirectives,
    cache_control: Option<HeaderValue>,
}

impl HttpCacheLayer {
    pub fn new(strategy: CacheStrategy) -> Self {
        let directives = strategy.directives();
        let cache_control = HeaderValue::from_str(&directives.header_value()).ok();

        Self {
            directives,
            cache_control,
        }
    }
}

impl<S> Layer<S> for HttpCacheLayer {
    type Service = HttpCache<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpCache {
            inner,
            etag: self.directives.etag && !self.directives.no_store,
            cache_control: self.cache_control.clone(),
        }
    }
}

/// Service produced by [`HttpCacheLayer`]
#[derive(Debug, Clone)]
pub struct HttpCache<S> {
    inner: S,
    etag: bool,
    cache_control: Option<HeaderValue>,
}

impl<S> Service<Request<Body>> for HttpCache<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // The clone that was polled ready handles this request
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let cacheable = matches!(*request.method(), Method::GET | Method::HEAD);
        if !cacheable {
            return Box::pin(inner.call(request));
        }

        let if_none_match = request.headers().get(header::IF_NONE_MATCH).cloned();
        let etag = self.etag;
        let cache_control = self.cache_control.clone();

        Box::pin(async move {
            let response = inner.call(request).await?;

            let mut response = if etag {
                apply_etag(response, if_none_match.as_ref()).await
            } else {
                response
            };

            let status = response.status();
            if status.is_success() || status == StatusCode::NOT_MODIFIED {
                if let Some(value) = cache_control {
                    let headers = response.headers_mut();
                    if !headers.contains_key(header::CACHE_CONTROL) {
                        headers.insert(header::CACHE_CONTROL, value);
                    }
                }
            }

            Ok(response)
        })
    }
}

async fn apply_etag(
    response: Response<Body>,
    if_none_match: Option<&HeaderValue>,
) -> Response<Body> {
    if response.status() != StatusCode::OK || response.headers().contains_key(header::ETAG) {
        return response;
    }

    let within_limit = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= MAX_ETAG_BODY_BYTES as u64);
    if !within_limit {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ETAG_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to buffer response body for ETag");
            let mut failed = Response::new(Body::empty());
            *failed.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return failed;
        }
    };

    let tag = weak_etag(&bytes);
    let Ok(tag_value) = HeaderValue::from_str(&tag) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    if if_none_match.is_some_and(|value| etag_matches(value, &tag)) {
        debug!(etag = %tag, "Conditional request matched, responding 304");
        parts.status = StatusCode::NOT_MODIFIED;
        strip_representation_headers(&mut parts.headers);
        parts.headers.insert(header::ETAG, tag_value);
        return Response::from_parts(parts, Body::empty());
    }

    parts.headers.insert(header::ETAG, tag_value);
    Response::from_parts(parts, Body::from(bytes))
}

/// Weak validator over the body: `W/"<len-hex>-<hash-hex>"`
pub fn weak_etag(body: &Bytes) -> String {
    let mut hasher = DefaultHasher::new();
    hasher.write(body);
    format!("W/\"{:x}-{:x}\"", body.len(), hasher.finish())
}

/// Weak comparison of an `If-None-Match` value against a validator
fn etag_matches(if_none_match: &HeaderValue, etag: &str) -> bool {
    let Ok(value) = if_none_match.to_str() else {
        return false;
    };

    let opaque = strip_weak(etag);
    value.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || (!candidate.is_empty() && strip_weak(candidate) == opaque)
    })
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

fn strip_representation_headers(headers: &mut HeaderMap) {
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::CONTENT_TYPE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::routing::get;
    use tower::ServiceExt;

    fn app(strategy: CacheStrategy) -> Router {
        Router::new()
            .route("/items", get(|| async { "[1,2,3]" }).post(|| async { "created" }))
            .route(
                "/preset",
                get(|| async {
                    (
                        [(header::CACHE_CONTROL, "max-age=5"), (header::ETAG, "\"v1\"")],
                        "body",
                    )
                }),
            )
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .layer(http_cache(strategy))
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn header_str<'a>(response: &'a Response<Body>, name: header::HeaderName) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_strategy_table() {
        assert_eq!(
            CacheStrategy::NoCache.directives().header_value(),
            "no-store, no-cache, must-revalidate"
        );
        assert_eq!(
            CacheStrategy::ShortLived.directives().header_value(),
            "public, max-age=300"
        );
        assert_eq!(
            CacheStrategy::MediumLived.directives().header_value(),
            "public, max-age=3600, stale-while-revalidate=600"
        );
        assert_eq!(
            CacheStrategy::LongLived.directives().header_value(),
            "public, max-age=86400, stale-while-revalidate=3600"
        );
        assert_eq!(
            CacheStrategy::ApiCache.directives().header_value(),
            "private, max-age=60, must-revalidate"
        );
        assert!(!CacheStrategy::NoCache.directives().etag);
    }

    #[test]
    fn test_custom_directives() {
        let directives = CacheDirectives::public(Duration::from_secs(120))
            .with_s_maxage(Duration::from_secs(600))
            .with_stale_while_revalidate(Duration::from_secs(30))
            .with_must_revalidate();

        assert_eq!(
            CacheStrategy::Custom(directives).directives().header_value(),
            "public, max-age=120, s-maxage=600, stale-while-revalidate=30, must-revalidate"
        );
    }

    #[test]
    fn test_weak_etag_is_content_addressed() {
        let a = weak_etag(&Bytes::from_static(b"hello"));
        let b = weak_etag(&Bytes::from_static(b"hello"));
        let c = weak_etag(&Bytes::from_static(b"hellp"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("W/\"5-"));
    }

    #[test]
    fn test_etag_matches() {
        let tag = "W/\"3-abc\"";
        assert!(etag_matches(&HeaderValue::from_static("W/\"3-abc\""), tag));
        assert!(etag_matches(&HeaderValue::from_static("\"3-abc\""), tag));
        assert!(etag_matches(&HeaderValue::from_static("\"x\", W/\"3-abc\""), tag));
        assert!(etag_matches(&HeaderValue::from_static("*"), tag));
        assert!(!etag_matches(&HeaderValue::from_static("W/\"3-abd\""), tag));
        assert!(!etag_matches(&HeaderValue::from_static(""), tag));
    }

    #[tokio::test]
    async fn test_get_attaches_etag_and_cache_control() {
        let response = app(CacheStrategy::MediumLived)
            .oneshot(request(Method::GET, "/items"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_str(&response, header::ETAG),
            Some(weak_etag(&Bytes::from_static(b"[1,2,3]")).as_str())
        );
        assert_eq!(
            header_str(&response, header::CACHE_CONTROL),
            Some("public, max-age=3600, stale-while-revalidate=600")
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"[1,2,3]");
    }

    #[tokio::test]
    async fn test_matching_if_none_match_returns_304() {
        let router = app(CacheStrategy::ApiCache);
        let first = router
            .clone()
            .oneshot(request(Method::GET, "/items"))
            .await
            .unwrap();
        let etag = first.headers().get(header::ETAG).cloned().unwrap();

        let mut conditional = request(Method::GET, "/items");
        conditional
            .headers_mut()
            .insert(header::IF_NONE_MATCH, etag.clone());
        let response = router.oneshot(conditional).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers().get(header::ETAG), Some(&etag));
        assert_eq!(
            header_str(&response, header::CACHE_CONTROL),
            Some("private, max-age=60, must-revalidate")
        );
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_stale_if_none_match_returns_fresh_body() {
        let mut conditional = request(Method::GET, "/items");
        conditional
            .headers_mut()
            .insert(header::IF_NONE_MATCH, HeaderValue::from_static("W/\"7-dead\""));

        let response = app(CacheStrategy::ShortLived)
            .oneshot(conditional)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::ETAG));
    }

    #[tokio::test]
    async fn test_no_cache_strategy_skips_etag() {
        let mut conditional = request(Method::GET, "/items");
        conditional
            .headers_mut()
            .insert(header::IF_NONE_MATCH, HeaderValue::from_static("*"));

        let response = app(CacheStrategy::NoCache).oneshot(conditional).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::ETAG).is_none());
        assert_eq!(
            header_str(&response, header::CACHE_CONTROL),
            Some("no-store, no-cache, must-revalidate")
        );
    }

    #[tokio::test]
    async fn test_existing_headers_are_kept() {
        let response = app(CacheStrategy::LongLived)
            .oneshot(request(Method::GET, "/preset"))
            .await
            .unwrap();

        assert_eq!(header_str(&response, header::CACHE_CONTROL), Some("max-age=5"));
        assert_eq!(header_str(&response, header::ETAG), Some("\"v1\""));
    }

    #[tokio::test]
    async fn test_writes_pass_through() {
        let response = app(CacheStrategy::LongLived)
            .oneshot(request(Method::POST, "/items"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::ETAG).is_none());
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let response = app(CacheStrategy::LongLived)
            .oneshot(request(Method::GET, "/missing"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::ETAG).is_none());
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_unbounded_body_skips_etag() {
        let router = Router::new()
            .route(
                "/stream",
                get(|| async {
                    let chunks = futures::stream::iter(vec![Ok::<_, std::io::Error>(
                        Bytes::from_static(b"chunk"),
                    )]);
                    Body::from_stream(chunks)
                }),
            )
            .layer(http_cache(CacheStrategy::ShortLived));

        let response = router.oneshot(request(Method::GET, "/stream")).await.unwrap();

        assert!(response.headers().get(header::ETAG).is_none());
        assert_eq!(
            header_str(&response, header::CACHE_CONTROL),
            Some("public, max-age=300")
        );
    }
}
