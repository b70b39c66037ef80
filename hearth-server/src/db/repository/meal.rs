//! Meal repository
//!
//! Catalog reads plus the stock reserve/release pair. Reservation is a
//! single guarded UPDATE; with stock 5 and two concurrent reserves of
//! 3, exactly one lands.

use async_trait::async_trait;
use shared::models::Meal;
use shared::util::now_millis;
use shared::{AppError, AppResult};
use sqlx::SqlitePool;

use crate::orders::service::MealRegistry;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(
        "SELECT id, chef_id, name, description, price, is_active, available_quantity, daily_limit, created_at, updated_at FROM meals WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(meal)
}

pub async fn find_active(pool: &SqlitePool, limit: i64, offset: i64) -> AppResult<Vec<Meal>> {
    let meals = sqlx::query_as::<_, Meal>(
        "SELECT id, chef_id, name, description, price, is_active, available_quantity, daily_limit, created_at, updated_at FROM meals WHERE is_active = 1 ORDER BY id LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(meals)
}

/// Take `quantity` units of stock.
///
/// The UPDATE only lands when the meal is active and the counter
/// covers the request; a miss is classified by re-reading the row.
/// Meals with NULL stock are not managed and succeed without change.
pub async fn reserve(pool: &SqlitePool, meal_id: i64, quantity: i64) -> AppResult<()> {
    let rows = sqlx::query(
        "UPDATE meals SET available_quantity = available_quantity - ?1, updated_at = ?2 WHERE id = ?3 AND is_active = 1 AND available_quantity IS NOT NULL AND available_quantity >= ?1",
    )
    .bind(quantity)
    .bind(now_millis())
    .bind(meal_id)
    .execute(pool)
    .await?
    .rows_affected();

    if rows > 0 {
        return Ok(());
    }

    match find_by_id(pool, meal_id).await? {
        None => Err(AppError::meal_unavailable(format!("meal {meal_id} not found"))),
        Some(meal) if !meal.is_active => Err(AppError::meal_unavailable(format!(
            "meal '{}' is not active",
            meal.name
        ))),
        Some(meal) => match meal.available_quantity {
            // Unmanaged stock: nothing to reserve.
            None => Ok(()),
            Some(available) => Err(AppError::insufficient_stock(format!(
                "insufficient stock for meal '{}': {available} available, {quantity} requested",
                meal.name
            ))),
        },
    }
}

/// Return `quantity` units of stock. Unmanaged and missing meals stay
/// untouched so compensation after a partial failure never fails.
pub async fn release(pool: &SqlitePool, meal_id: i64, quantity: i64) -> AppResult<()> {
    sqlx::query(
        "UPDATE meals SET available_quantity = available_quantity + ?1, updated_at = ?2 WHERE id = ?3 AND available_quantity IS NOT NULL",
    )
    .bind(quantity)
    .bind(now_millis())
    .bind(meal_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// [`MealRegistry`] backed by the `meals` table.
#[derive(Clone)]
pub struct DbMealRegistry {
    pool: SqlitePool,
}

impl DbMealRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MealRegistry for DbMealRegistry {
    async fn snapshot(&self, meal_id: i64) -> AppResult<Option<Meal>> {
        find_by_id(&self.pool, meal_id).await
    }

    async fn reserve(&self, meal_id: i64, quantity: i64) -> AppResult<()> {
        reserve(&self.pool, meal_id, quantity).await
    }

    async fn release(&self, meal_id: i64, quantity: i64) -> AppResult<()> {
        release(&self.pool, meal_id, quantity).await
    }
}
