//! Equipment lookup by category

use std::sync::Arc;

use axum::extract::{Path, State};

use crate::api::resources::ListResponse;
use crate::api::types::{ApiError, Json};
use crate::domain::{Equipment, EquipmentCategory};
use crate::infrastructure::repository::CachedRepository;

/// GET /api/equipment/category/{category}
pub async fn by_category(
    State(repo): State<Arc<CachedRepository<Equipment>>>,
    Path(category): Path<String>,
) -> Result<Json<ListResponse<Equipment>>, ApiError> {
    let category: EquipmentCategory = category
        .parse()
        .map_err(|e| ApiError::from(e).with_param("category"))?;

    let rows = repo.find_by_category(category).await?;
    Ok(Json(ListResponse::from(rows)))
}
