//! Operator endpoints for the cache store

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{
    BodyMetric, CacheStats, Equipment, Exercise, KeyPattern, Resource, User, WorkoutPlan,
};
use crate::infrastructure::cache::CacheManager;

const MAX_PATTERN_LENGTH: usize = 256;

#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub pattern: String,
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub backend: &'static str,
    #[serde(flatten)]
    pub stats: CacheStats,
}

/// GET /api/cache/stats
pub async fn stats(State(cache): State<Arc<CacheManager>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        backend: cache.backend_name(),
        stats: cache.get_stats().await,
    })
}

/// DELETE /api/cache/stats
pub async fn reset_stats(State(cache): State<Arc<CacheManager>>) -> StatusCode {
    cache.reset_stats();
    info!("Cache statistics reset");
    StatusCode::NO_CONTENT
}

/// POST /api/cache/invalidate
pub async fn invalidate(
    State(cache): State<Arc<CacheManager>>,
    Json(request): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    let pattern = request.pattern.trim();
    if pattern.is_empty() {
        return Err(ApiError::bad_request("pattern must not be empty").with_param("pattern"));
    }
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(ApiError::bad_request(format!(
            "pattern must be at most {} characters",
            MAX_PATTERN_LENGTH
        ))
        .with_param("pattern"));
    }

    let removed = cache.delete_by_pattern(&KeyPattern::new(pattern)).await;
    info!(pattern, removed, "Cache invalidated by operator");

    Ok(Json(InvalidateResponse {
        pattern: pattern.to_string(),
        removed,
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    pub resource: &'static str,
    pub removed: usize,
}

/// DELETE /api/cache/resources/{resource}
///
/// Drops every cached entry of one resource namespace.
pub async fn purge_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let (resource, removed) = match resource.as_str() {
        User::NAME => (User::NAME, state.users.invalidate_all().await),
        Equipment::NAME => (Equipment::NAME, state.equipment.invalidate_all().await),
        Exercise::NAME => (Exercise::NAME, state.exercises.invalidate_all().await),
        WorkoutPlan::NAME => (WorkoutPlan::NAME, state.workout_plans.invalidate_all().await),
        BodyMetric::NAME => (BodyMetric::NAME, state.body_metrics.invalidate_all().await),
        other => {
            return Err(ApiError::not_found(format!("Unknown cached resource '{}'", other))
                .with_param("resource"));
        }
    };

    info!(resource, removed, "Resource cache purged by operator");
    Ok(Json(PurgeResponse { resource, removed }))
}

/// DELETE /api/cache
pub async fn flush(State(cache): State<Arc<CacheManager>>) -> Result<StatusCode, ApiError> {
    if cache.flush().await {
        info!("Cache flushed by operator");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::unavailable("Cache backend did not accept the flush"))
    }
}
