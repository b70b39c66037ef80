//! HTTP API
//!
//! Every resource mounts itself under `/api/v1`:
//!
//! - [`health`] - liveness probe
//! - [`meals`] - public catalog reads
//! - [`carts`] - the caller's cart
//! - [`orders`] - checkout, queries, admin transitions, cancellation
//! - [`sub_orders`] - chef-side slice transitions

pub mod carts;
pub mod health;
pub mod meals;
pub mod orders;
pub mod sub_orders;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use http::request::Parts;
use shared::AppError;

/// `axum::Json` with its rejection mapped into the error envelope, so
/// a malformed body comes back in the same JSON shape as every other
/// error.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::invalid_request(rejection.body_text())),
        }
    }
}

/// `axum::extract::Query` with the same envelope treatment.
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::invalid_request(rejection.body_text())),
        }
    }
}
