//! Observability infrastructure - Tracing and Metrics

mod config;
mod metrics;
mod tracing_setup;

pub use config::{MetricsConfig, ObservabilityConfig, TracingConfig};
pub use metrics::{
    LookupOutcome, PrometheusMetrics, RepositoryQueryMetricParams, create_metrics_router,
    init_metrics, record_cache_error, record_cache_invalidation, record_cache_lookup,
    record_cache_size, record_http_request, record_repository_query,
};
pub use tracing_setup::{init_tracing, shutdown_tracing};
