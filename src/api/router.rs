use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::middleware::{
    CacheStrategy, http_cache, logging_middleware, metrics_middleware,
    security_headers_middleware,
};
use super::state::AppState;
use super::{cache, equipment, health, resources, users};
use crate::domain::{BodyMetric, Equipment, Exercise, User, WorkoutPlan};
use crate::infrastructure::observability::{PrometheusMetrics, create_metrics_router};

/// Create the full router with application state
///
/// Read routes carry their caching strategy; `security_headers_middleware`
/// runs outside them and only fills in `Cache-Control` when a route left it unset.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/api", api_router())
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Router plus the Prometheus endpoint when metrics are enabled
pub fn create_router_with_metrics(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    path: &str,
) -> Router {
    let router = create_router(state);

    match metrics {
        Some(handle) => router.merge(create_metrics_router(handle, path)),
        None => router,
    }
}

fn api_router() -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(equipment_routes())
        .merge(exercise_routes())
        .merge(workout_plan_routes())
        .merge(body_metric_routes())
        .merge(cache_routes())
}

fn user_routes() -> Router<AppState> {
    let reads = Router::new()
        .route("/users", get(resources::list::<User>))
        .route("/users/{id}", get(resources::get_one::<User>))
        .route("/users/by-email/{email}", get(users::get_by_email))
        .route_layer(http_cache(CacheStrategy::ApiCache));

    let writes = Router::new()
        .route("/users", post(users::register))
        .route(
            "/users/{id}",
            axum::routing::patch(users::update_profile).delete(resources::remove::<User>),
        );

    reads.merge(writes)
}

fn equipment_routes() -> Router<AppState> {
    let reads = Router::new()
        .route("/equipment", get(resources::list::<Equipment>))
        .route("/equipment/{id}", get(resources::get_one::<Equipment>))
        .route("/equipment/category/{category}", get(equipment::by_category))
        .route_layer(http_cache(CacheStrategy::MediumLived));

    reads.merge(crud_writes::<Equipment>("/equipment"))
}

fn exercise_routes() -> Router<AppState> {
    let reads = Router::new()
        .route("/exercises", get(resources::list::<Exercise>))
        .route("/exercises/{id}", get(resources::get_one::<Exercise>))
        .route_layer(http_cache(CacheStrategy::LongLived));

    reads.merge(crud_writes::<Exercise>("/exercises"))
}

fn workout_plan_routes() -> Router<AppState> {
    let reads = Router::new()
        .route("/workout-plans", get(resources::list::<WorkoutPlan>))
        .route("/workout-plans/{id}", get(resources::get_one::<WorkoutPlan>))
        .route_layer(http_cache(CacheStrategy::ApiCache));

    reads.merge(crud_writes::<WorkoutPlan>("/workout-plans"))
}

fn body_metric_routes() -> Router<AppState> {
    let reads = Router::new()
        .route("/body-metrics", get(resources::list::<BodyMetric>))
        .route("/body-metrics/{id}", get(resources::get_one::<BodyMetric>))
        .route_layer(http_cache(CacheStrategy::ApiCache));

    reads.merge(crud_writes::<BodyMetric>("/body-metrics"))
}

fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/cache", axum::routing::delete(cache::flush))
        .route("/cache/stats", get(cache::stats).delete(cache::reset_stats))
        .route("/cache/invalidate", post(cache::invalidate))
        .route(
            "/cache/resources/{resource}",
            axum::routing::delete(cache::purge_resource),
        )
        .route_layer(http_cache(CacheStrategy::NoCache))
}

/// `POST /base`, `PATCH /base/{id}` and `DELETE /base/{id}`
fn crud_writes<E>(base: &str) -> Router<AppState>
where
    E: crate::domain::Resource,
    std::sync::Arc<crate::infrastructure::repository::CachedRepository<E>>:
        axum::extract::FromRef<AppState>,
{
    Router::new()
        .route(base, post(resources::create::<E>))
        .route(
            &format!("{}/{{id}}", base),
            axum::routing::patch(resources::update::<E>).delete(resources::remove::<E>),
        )
}
