//! Unified error handling
//!
//! Provides the application error type and the wire envelope every
//! failing endpoint returns:
//!
//! ```json
//! { "error": "INSUFFICIENT_STOCK", "message": "insufficient stock for meal 'Lentil soup': 1 available, 2 requested" }
//! ```
//!
//! # Kinds
//!
//! | Kind | HTTP status |
//! |------|-------------|
//! | INVALID_REQUEST | 400 |
//! | UNAUTHENTICATED | 401 |
//! | FORBIDDEN | 403 |
//! | NOT_FOUND | 404 |
//! | MEAL_UNAVAILABLE, INSUFFICIENT_STOCK, STOCK_UNMANAGED | 409 |
//! | INVALID_TRANSITION, NOT_CANCELLABLE | 409 |
//! | PERSISTENCE, INTERNAL | 500 |
//! | TIMEOUT | 504 |
//!
//! Database and internal detail never crosses HTTP: it is logged and
//! replaced with a fixed message in [`AppError::into_response`].

mod types;

pub use types::{AppError, AppResult, ErrorBody};
