//! Order API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_admin).post(handler::checkout))
        .route("/user", get(handler::list_mine))
        .route("/by-chef", get(handler::chef_queue))
        .route("/{id}", get(handler::get_by_id).delete(handler::cancel))
        .route(
            "/{id}/status",
            put(handler::update_status).layer(middleware::from_fn(require_admin)),
        )
}
