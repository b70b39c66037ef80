//! Shared types for the hearth marketplace
//!
//! Domain models, error vocabulary and small utilities used by the
//! server crate. Row mapping for SQLite lives behind the `db` feature
//! so non-server consumers stay free of sqlx.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorBody};
pub use serde::{Deserialize, Serialize};
