//! Order handlers
//!
//! Access rules live here: users see their own orders, chefs their
//! queue, admins everything.

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use http::StatusCode;
use serde::Deserialize;
use shared::models::{
    CheckoutRequest, ChefQueueEntry, Order, OrderDetail, OrderStatus, OrderStatusUpdate,
    SubOrderStatus,
};
use shared::{AppError, AppResult};

use crate::api::{AppJson, AppQuery};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::time;

/// Query parameters for the admin listing.
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<OrderStatus>,
    /// Inclusive local date, YYYY-MM-DD.
    pub from: Option<String>,
    /// Inclusive local date, YYYY-MM-DD.
    pub to: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    pub status: Option<SubOrderStatus>,
    /// Admins must name the chef whose queue they want.
    pub chef_id: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// POST /api/v1/orders - checkout the caller's cart (or an explicit item list)
pub async fn checkout(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(req): AppJson<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    let detail = state.order_service.checkout(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/v1/orders - admin listing by status or by creation date range
pub async fn list_admin(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<AdminListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    if !user.is_admin() {
        return Err(AppError::forbidden("admin role required"));
    }
    let limit = query.limit.clamp(1, 200);
    let offset = query.offset.max(0);

    let orders = if let Some(status) = query.status {
        state
            .order_service
            .orders_by_status(status, limit, offset)
            .await?
    } else if let (Some(from), Some(to)) = (&query.from, &query.to) {
        let tz = state.config.timezone;
        let from_millis = time::day_start_millis(time::parse_date(from)?, tz);
        let to_millis = time::day_end_millis(time::parse_date(to)?, tz);
        state
            .order_service
            .orders_in_range(from_millis, to_millis, limit, offset)
            .await?
    } else {
        return Err(AppError::invalid_request(
            "provide either status or from/to dates",
        ));
    };
    Ok(Json(orders))
}

/// GET /api/v1/orders/{id} - one order with sub-orders and items, owner or admin
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.order_service.order_detail(id).await?;
    if detail.order.user_id != user.id && !user.is_admin() {
        return Err(AppError::forbidden("not your order"));
    }
    Ok(Json(detail))
}

/// GET /api/v1/orders/user - the caller's orders, newest first
pub async fn list_mine(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state
        .order_service
        .orders_of_user(user.id, query.limit.clamp(1, 200), query.offset.max(0))
        .await?;
    Ok(Json(orders))
}

/// GET /api/v1/orders/by-chef - a chef's queue, newest first
///
/// Chefs always get their own queue. Admins pick one with `chef_id`.
pub async fn chef_queue(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<QueueQuery>,
) -> AppResult<Json<Vec<ChefQueueEntry>>> {
    let chef_id = match (user.chef_id, query.chef_id) {
        (Some(own), _) if user.is_chef() => own,
        (_, Some(picked)) if user.is_admin() => picked,
        _ => return Err(AppError::forbidden("chef role required")),
    };
    let entries = state
        .order_service
        .chef_queue(
            chef_id,
            query.status,
            query.limit.clamp(1, 200),
            query.offset.max(0),
        )
        .await?;
    Ok(Json(entries))
}

/// PUT /api/v1/orders/{id}/status - admin-driven parent transition
///
/// Only `DELIVERING` and `DELIVERING -> DELIVERED` are accepted here;
/// everything else is derived from the sub-orders.
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    AppJson(body): AppJson<OrderStatusUpdate>,
) -> AppResult<Json<OrderDetail>> {
    state.order_service.advance_order(id, body.status).await?;
    let detail = state.order_service.order_detail(id).await?;
    Ok(Json(detail))
}

/// DELETE /api/v1/orders/{id} - cancel a whole order, owner or admin
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.order_service.order_detail(id).await?;
    if detail.order.user_id != user.id && !user.is_admin() {
        return Err(AppError::forbidden("not your order"));
    }
    state.order_service.cancel_order(id).await?;
    let detail = state.order_service.order_detail(id).await?;
    Ok(Json(detail))
}
