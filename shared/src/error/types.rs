use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application-level error, one variant per wire kind.
///
/// Conflict-family variants carry a human message describing the
/// specific violation; the kind string is what clients branch on.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload failed validation. Message names the first
    /// offending field.
    #[error("{0}")]
    InvalidRequest(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated but not allowed to touch this resource.
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Meal exists but is not currently orderable.
    #[error("{0}")]
    MealUnavailable(String),

    /// Managed stock cannot cover the requested quantity.
    #[error("{0}")]
    InsufficientStock(String),

    /// Stock operation attempted on a meal without managed stock.
    #[error("{0}")]
    StockUnmanaged(String),

    /// Status change not permitted by the lifecycle graph.
    #[error("{0}")]
    InvalidTransition(String),

    /// Order is past the point where cancellation is allowed.
    #[error("{0}")]
    NotCancellable(String),

    /// Lock or connection wait exceeded the deadline.
    #[error("{0}")]
    Timeout(String),

    /// Storage failure. The payload is driver detail for the log,
    /// never for the client.
    #[error("{0}")]
    Persistence(String),

    /// Anything else that escaped the layers above.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    // ========== Constructors ==========

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn meal_unavailable(msg: impl Into<String>) -> Self {
        Self::MealUnavailable(msg.into())
    }

    pub fn insufficient_stock(msg: impl Into<String>) -> Self {
        Self::InsufficientStock(msg.into())
    }

    pub fn stock_unmanaged(msg: impl Into<String>) -> Self {
        Self::StockUnmanaged(msg.into())
    }

    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidTransition(format!("cannot move from {from} to {to}"))
    }

    pub fn not_cancellable(current: impl std::fmt::Display) -> Self {
        Self::NotCancellable(format!("order in status {current} can no longer be cancelled"))
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    // ========== Classification ==========

    /// Stable machine-readable kind, the `error` field on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MealUnavailable(_) => "MEAL_UNAVAILABLE",
            Self::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            Self::StockUnmanaged(_) => "STOCK_UNMANAGED",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::NotCancellable(_) => "NOT_CANCELLABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Persistence(_) => "PERSISTENCE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MealUnavailable(_)
            | Self::InsufficientStock(_)
            | Self::StockUnmanaged(_)
            | Self::InvalidTransition(_)
            | Self::NotCancellable(_) => StatusCode::CONFLICT,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON envelope returned on every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Persistence(detail) => {
                tracing::error!(target: "database", error = %detail, "storage failure");
                "a storage error occurred".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(target: "server", error = %detail, "internal error");
                "an internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.kind().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(feature = "db")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                Self::Timeout("timed out waiting for a database connection".to_string())
            }
            other => Self::Persistence(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AppError::invalid_request("x").kind(), "INVALID_REQUEST");
        assert_eq!(AppError::unauthenticated("x").kind(), "UNAUTHENTICATED");
        assert_eq!(AppError::forbidden("x").kind(), "FORBIDDEN");
        assert_eq!(AppError::not_found("x").kind(), "NOT_FOUND");
        assert_eq!(AppError::meal_unavailable("x").kind(), "MEAL_UNAVAILABLE");
        assert_eq!(AppError::insufficient_stock("x").kind(), "INSUFFICIENT_STOCK");
        assert_eq!(AppError::stock_unmanaged("x").kind(), "STOCK_UNMANAGED");
        assert_eq!(
            AppError::invalid_transition("READY", "PENDING").kind(),
            "INVALID_TRANSITION"
        );
        assert_eq!(AppError::not_cancellable("PREPARING").kind(), "NOT_CANCELLABLE");
        assert_eq!(AppError::timeout("x").kind(), "TIMEOUT");
        assert_eq!(AppError::Persistence("x".into()).kind(), "PERSISTENCE");
        assert_eq!(AppError::internal("x").kind(), "INTERNAL");
    }

    #[test]
    fn statuses_follow_kind_family() {
        assert_eq!(AppError::invalid_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::unauthenticated("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::insufficient_stock("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::invalid_transition("READY", "PENDING").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::timeout("x").status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            AppError::Persistence("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn transition_message_names_both_states() {
        let err = AppError::invalid_transition("READY", "PENDING");
        assert_eq!(err.to_string(), "cannot move from READY to PENDING");
    }

    #[tokio::test]
    async fn persistence_detail_is_redacted_on_the_wire() {
        let err = AppError::Persistence("UNIQUE constraint failed: orders.order_code".into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "PERSISTENCE");
        assert_eq!(body.message, "a storage error occurred");
        assert!(!body.message.contains("UNIQUE"));
    }

    #[tokio::test]
    async fn conflict_detail_reaches_the_client() {
        let err = AppError::insufficient_stock("meal 'Soup' has 1 left, requested 2");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "INSUFFICIENT_STOCK");
        assert_eq!(body.message, "meal 'Soup' has 1 left, requested 2");
    }
}
