//! Hearth Order Server - multi-vendor food ordering backend
//!
//! # Architecture overview
//!
//! The server takes a user's cart (or an explicit item list), splits it
//! into one sub-order per chef, and tracks each slice through its own
//! lifecycle while the parent order status is derived from the slices.
//!
//! - **HTTP API** (`api`): RESTful handlers under `/api/v1`
//! - **Authentication** (`auth`): JWT bearer tokens with user/chef/admin roles
//! - **Order pipeline** (`orders`): checkout, stock reservation, lifecycle
//! - **Database** (`db`): embedded SQLite via sqlx, migrations included
//!
//! # Module structure
//!
//! ```text
//! hearth-server/src/
//! ├── core/          # config, state, HTTP server
//! ├── auth/          # JWT validation, role middleware
//! ├── api/           # routes and handlers
//! ├── orders/        # checkout, codes, pricing, status graph
//! ├── db/            # pool setup and repositories
//! ├── routes/        # router assembly and middleware stack
//! └── utils/         # logger, time, validation helpers
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod routes;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::OrderService;
pub use shared::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - supports tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    __  __                 __  __
   / / / /__  ____ ______/ /_/ /_
  / /_/ / _ \/ __ `/ ___/ __/ __ \
 / __  /  __/ /_/ / /  / /_/ / / /
/_/ /_/\___/\__,_/_/   \__/_/ /_/
    "#
    );
}
