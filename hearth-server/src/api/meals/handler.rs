//! Meal catalog handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::Meal;
use shared::{AppError, AppResult};

use crate::api::AppQuery;
use crate::core::ServerState;
use crate::db::repository::meal;

/// Query params for listing meals
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/v1/meals - active meals, paged
pub async fn list(
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<Vec<Meal>>> {
    let meals = meal::find_active(&state.pool, query.limit.clamp(1, 200), query.offset.max(0)).await?;
    Ok(Json(meals))
}

/// GET /api/v1/meals/{id} - one meal
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Meal>> {
    let meal = meal::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("meal {id} not found")))?;
    Ok(Json(meal))
}
