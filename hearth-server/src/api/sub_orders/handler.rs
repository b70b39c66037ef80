//! Sub-order handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use shared::models::{OrderDetail, SubOrderStatusUpdate};
use shared::{AppError, AppResult};

use crate::api::AppJson;
use crate::auth::CurrentUser;
use crate::core::ServerState;

/// PUT /api/v1/sub-orders/{id}/status - advance one chef's slice
///
/// Allowed for the owning chef or an admin. The parent order status is
/// recomputed in the same transaction as the slice update; the response
/// is the whole aggregate so callers see both at once.
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    AppJson(body): AppJson<SubOrderStatusUpdate>,
) -> AppResult<Json<OrderDetail>> {
    let sub = state.order_service.sub_order(id).await?;
    let owns_slice = user.is_chef() && user.chef_id == Some(sub.chef_id);
    if !owns_slice && !user.is_admin() {
        return Err(AppError::forbidden("not your sub-order"));
    }
    let sub = state
        .order_service
        .advance_sub_order(id, body.status, body.chef_note)
        .await?;
    let detail = state.order_service.order_detail(sub.order_id).await?;
    Ok(Json(detail))
}
