//! User endpoints with email uniqueness and lookup by email

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::debug;

use crate::api::resources::parse_id;
use crate::api::types::{ApiError, Json};
use crate::domain::User;
use crate::domain::user::{UserDraft, UserPatch};
use crate::infrastructure::repository::CachedRepository;

/// POST /api/users
pub async fn register(
    State(repo): State<Arc<CachedRepository<User>>>,
    Json(draft): Json<UserDraft>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    debug!("Registering user");

    let user = repo.register(draft).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH /api/users/{id}
pub async fn update_profile(
    State(repo): State<Arc<CachedRepository<User>>>,
    Path(raw_id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id::<User>(&raw_id)?;
    debug!(user_id = %id, "Updating user profile");

    let user = repo.update_profile(&id, patch).await?;
    Ok(Json(user))
}

/// GET /api/users/by-email/{email}
pub async fn get_by_email(
    State(repo): State<Arc<CachedRepository<User>>>,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No user with email '{}'", email)))?;

    Ok(Json(user))
}
