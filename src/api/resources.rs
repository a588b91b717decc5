//! CRUD endpoints shared by every cached resource
//!
//! Each handler is generic over the resource; the router instantiates them,
//! e.g. `get(resources::list::<Equipment>)`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::types::{ApiError, Json, Query};
use crate::domain::{Resource, StorageKey};
use crate::infrastructure::repository::CachedRepository;

/// List response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        let count = data.len();
        Self { data, count }
    }
}

/// `?include=a,b` on single-entity reads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IncludeQuery {
    pub include: Option<String>,
}

impl IncludeQuery {
    /// Parse the requested relations; unknown names are rejected
    pub fn relations<E: Resource>(&self) -> Result<Vec<E::Relation>, ApiError> {
        let Some(raw) = &self.include else {
            return Ok(Vec::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                name.parse::<E::Relation>()
                    .map_err(|e| ApiError::from(e).with_param("include"))
            })
            .collect()
    }
}

pub(crate) fn parse_id<E: Resource>(raw: &str) -> Result<E::Key, ApiError> {
    E::Key::parse(raw).map_err(ApiError::from)
}

/// GET /api/{resource}
pub async fn list<E: Resource>(
    State(repo): State<Arc<CachedRepository<E>>>,
    Query(filter): Query<E::Filter>,
) -> Result<Json<ListResponse<E>>, ApiError> {
    debug!(resource = E::NAME, filter = ?filter, "Listing");

    let rows = repo.find_many(&filter).await?;
    Ok(Json(ListResponse::from(rows)))
}

/// GET /api/{resource}/{id}
pub async fn get_one<E: Resource>(
    State(repo): State<Arc<CachedRepository<E>>>,
    Path(raw_id): Path<String>,
    Query(include): Query<IncludeQuery>,
) -> Result<Json<E>, ApiError> {
    let id = parse_id::<E>(&raw_id)?;
    let relations = include.relations::<E>()?;

    let entity = repo
        .find_by_id(&id, &relations)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} '{}' not found", E::NAME, id)))?;

    Ok(Json(entity))
}

/// POST /api/{resource}
pub async fn create<E: Resource>(
    State(repo): State<Arc<CachedRepository<E>>>,
    Json(draft): Json<E::Draft>,
) -> Result<(StatusCode, Json<E>), ApiError> {
    debug!(resource = E::NAME, "Creating");

    let created = repo.create(draft).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/{resource}/{id}
pub async fn update<E: Resource>(
    State(repo): State<Arc<CachedRepository<E>>>,
    Path(raw_id): Path<String>,
    Json(patch): Json<E::Patch>,
) -> Result<Json<E>, ApiError> {
    let id = parse_id::<E>(&raw_id)?;
    debug!(resource = E::NAME, id = %id, "Updating");

    let updated = repo.update(&id, patch).await?;
    Ok(Json(updated))
}

/// DELETE /api/{resource}/{id}
pub async fn remove<E: Resource>(
    State(repo): State<Arc<CachedRepository<E>>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id::<E>(&raw_id)?;
    debug!(resource = E::NAME, id = %id, "Deleting");

    if repo.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("{} '{}' not found", E::NAME, id)))
    }
}
