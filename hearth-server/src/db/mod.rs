//! Database module
//!
//! SQLite connection pool and migrations.

pub mod repository;

use std::str::FromStr;
use std::time::Duration;

use shared::{AppError, AppResult};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

/// Open the SQLite pool and apply migrations.
///
/// The pool holds a single connection: every transaction in the order
/// pipeline runs strictly serialized, which is what the status machine
/// and the stock counters rely on.
pub async fn connect(database_path: &str) -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))
        .map_err(|e| AppError::Persistence(format!("invalid database path: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .optimize_on_close(true, None);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| AppError::Persistence(format!("failed to open database: {e}")))?;

    tracing::info!(path = database_path, "database connection established (SQLite WAL)");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::Persistence(format!("failed to apply migrations: {e}")))?;
    tracing::info!("database migrations applied");

    Ok(pool)
}
