//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("fittrack_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Hit,
    Miss,
}

impl LookupOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}

/// Record a cache lookup, labelled by the key's namespace
pub fn record_cache_lookup(key: &str, outcome: LookupOutcome) {
    counter!(
        "cache_lookups_total",
        "resource" => key_namespace(key).to_string(),
        "outcome" => outcome.as_str(),
    )
    .increment(1);
}

/// Record an absorbed cache backend failure
pub fn record_cache_error(operation: &'static str) {
    counter!("cache_errors_total", "operation" => operation).increment(1);
}

/// Record a pattern delete and the number of keys it removed
///
/// Operator sweeps carry arbitrary patterns, so anything outside the known
/// resource namespaces is folded into `other`.
pub fn record_cache_invalidation(pattern: &str, removed: usize) {
    let resource = invalidation_resource(pattern);
    counter!("cache_invalidations_total", "resource" => resource).increment(1);
    counter!("cache_invalidated_keys_total", "resource" => resource).increment(removed as u64);
}

/// Record the live entry count last observed
pub fn record_cache_size(size: usize) {
    gauge!("cache_entries").set(size as f64);
}

/// Parameters for repository query metrics
pub struct RepositoryQueryMetricParams<'a> {
    pub resource: &'a str,
    pub operation: &'a str,
    pub duration: Duration,
    pub slow: bool,
}

/// Record a storage query issued by a cached repository
pub fn record_repository_query(params: RepositoryQueryMetricParams<'_>) {
    let labels = [
        ("resource", params.resource.to_string()),
        ("operation", params.operation.to_string()),
    ];

    histogram!("repository_query_duration_seconds", &labels)
        .record(params.duration.as_secs_f64());

    if params.slow {
        counter!("repository_slow_queries_total", &labels).increment(1);
    }
}

/// First key segment, which is the resource name for every key we build
fn key_namespace(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}

/// Resource label for an invalidation pattern, limited to a fixed set
fn invalidation_resource(pattern: &str) -> &'static str {
    const RESOURCES: [&str; 5] = ["user", "equipment", "exercise", "workout_plan", "body_metric"];

    let namespace = key_namespace(pattern);
    RESOURCES
        .into_iter()
        .find(|resource| *resource == namespace)
        .unwrap_or("other")
}

/// Sanitize URL path for metric labels (remove IDs, limit cardinality)
fn sanitize_path(path: &str) -> String {
    let path = path
        .split('/')
        .map(|segment| {
            let is_id = uuid::Uuid::parse_str(segment).is_ok()
                || (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()));
            if is_id { "{id}" } else { segment }
        })
        .collect::<Vec<_>>()
        .join("/");

    match path.char_indices().nth(50) {
        Some((end, _)) => path[..end].to_string(),
        None => path,
    }
}
