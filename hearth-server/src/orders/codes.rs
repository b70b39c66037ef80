//! Daily order code allocation
//!
//! Codes look like `ORD-20250301-007`: the day in the configured
//! timezone plus a per-day sequence starting at 1. The sequence lives
//! in the `order_counters` table and is advanced with a single upsert,
//! so concurrent checkouts can never draw the same number.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared::AppResult;
use sqlx::SqlitePool;

use crate::orders::service::OrderCodeGenerator;

pub struct OrderCodeAllocator {
    pool: SqlitePool,
    tz: Tz,
}

impl OrderCodeAllocator {
    pub fn new(pool: SqlitePool, tz: Tz) -> Self {
        Self { pool, tz }
    }
}

#[async_trait]
impl OrderCodeGenerator for OrderCodeAllocator {
    async fn next_order_code(&self, now: DateTime<Utc>) -> AppResult<String> {
        let day = now.with_timezone(&self.tz).format("%Y%m%d").to_string();
        let seq = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO order_counters (day, next_seq)
            VALUES (?1, 1)
            ON CONFLICT(day) DO UPDATE SET next_seq = next_seq + 1
            RETURNING next_seq
            "#,
        )
        .bind(&day)
        .fetch_one(&self.pool)
        .await?;

        Ok(format!("ORD-{day}-{seq:03}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn istanbul() -> Tz {
        chrono_tz::Europe::Istanbul
    }

    // A single connection keeps the in-memory database alive and shared.
    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE order_counters (day TEXT PRIMARY KEY, next_seq INTEGER NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_codes_increment_within_a_day() {
        let allocator = OrderCodeAllocator::new(test_pool().await, istanbul());
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        assert_eq!(allocator.next_order_code(now).await.unwrap(), "ORD-20250301-001");
        assert_eq!(allocator.next_order_code(now).await.unwrap(), "ORD-20250301-002");
        assert_eq!(allocator.next_order_code(now).await.unwrap(), "ORD-20250301-003");
    }

    #[tokio::test]
    async fn test_sequence_resets_per_day() {
        let allocator = OrderCodeAllocator::new(test_pool().await, istanbul());
        let day_one = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let day_two = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();

        assert_eq!(allocator.next_order_code(day_one).await.unwrap(), "ORD-20250301-001");
        assert_eq!(allocator.next_order_code(day_two).await.unwrap(), "ORD-20250302-001");
        assert_eq!(allocator.next_order_code(day_one).await.unwrap(), "ORD-20250301-002");
    }

    #[tokio::test]
    async fn test_day_follows_configured_timezone() {
        // 22:30 UTC is already the next day in Istanbul (UTC+3).
        let allocator = OrderCodeAllocator::new(test_pool().await, istanbul());
        let now = Utc.with_ymd_and_hms(2025, 2, 28, 22, 30, 0).unwrap();

        assert_eq!(allocator.next_order_code(now).await.unwrap(), "ORD-20250301-001");
    }

    #[tokio::test]
    async fn test_sequence_pads_to_three_digits() {
        let allocator = OrderCodeAllocator::new(test_pool().await, istanbul());
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        sqlx::query("INSERT INTO order_counters (day, next_seq) VALUES ('20250301', 99)")
            .execute(&allocator.pool)
            .await
            .unwrap();

        assert_eq!(allocator.next_order_code(now).await.unwrap(), "ORD-20250301-100");
    }

    #[tokio::test]
    async fn test_sub_order_code_appends_chef_suffix() {
        let allocator = OrderCodeAllocator::new(test_pool().await, istanbul());
        assert_eq!(
            allocator.sub_order_code("ORD-20250301-001", 42),
            "ORD-20250301-001-CHEF42"
        );
    }
}
