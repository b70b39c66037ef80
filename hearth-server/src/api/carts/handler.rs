//! Cart handlers
//!
//! All routes act on the authenticated caller's cart; there is no way
//! to address another user's cart.

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use http::StatusCode;
use shared::models::{CartDetail, CartItem, CartItemCreate, CartItemUpdate};
use shared::{AppError, AppResult};

use crate::api::AppJson;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::cart;
use crate::orders::money::MAX_QUANTITY;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};

fn validate_quantity(quantity: i64) -> AppResult<()> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::invalid_request(format!(
            "quantity must be between 1 and {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

/// GET /api/v1/carts - the caller's cart with its lines
pub async fn get(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<CartDetail>> {
    let detail = cart::detail(&state.pool, user.id).await?;
    Ok(Json(detail))
}

/// POST /api/v1/carts/items - add a meal to the cart
pub async fn add_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(data): AppJson<CartItemCreate>,
) -> AppResult<(StatusCode, Json<CartItem>)> {
    validate_quantity(data.quantity)?;
    validate_optional_text(&data.note, "note", MAX_NOTE_LEN)?;

    let cart = cart::get_or_create(&state.pool, user.id).await?;
    let item = cart::add_item(&state.pool, cart.id, data).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/v1/carts/items/{item_id} - change quantity or note
pub async fn update_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<i64>,
    AppJson(data): AppJson<CartItemUpdate>,
) -> AppResult<Json<CartItem>> {
    if let Some(quantity) = data.quantity {
        validate_quantity(quantity)?;
    }
    validate_optional_text(&data.note, "note", MAX_NOTE_LEN)?;

    let cart = cart::get_or_create(&state.pool, user.id).await?;
    let item = cart::update_item(&state.pool, cart.id, item_id, data).await?;
    Ok(Json(item))
}

/// DELETE /api/v1/carts/items/{item_id} - drop one line
pub async fn remove_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(item_id): Path<i64>,
) -> AppResult<StatusCode> {
    let cart = cart::get_or_create(&state.pool, user.id).await?;
    cart::remove_item(&state.pool, cart.id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/carts - drop every line
pub async fn clear(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<StatusCode> {
    let cart = cart::get_or_create(&state.pool, user.id).await?;
    cart::clear(&state.pool, cart.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
