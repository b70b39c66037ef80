//! Sub-order API (chef-side transitions)

mod handler;

use axum::{Router, routing::put};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/sub-orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/{id}/status", put(handler::update_status))
}
