//! Cart repository
//!
//! One cart per user, created on first touch. Lines keep insertion
//! order through their rowids; adding a meal already in the cart
//! merges into the existing line.

use async_trait::async_trait;
use shared::models::{Cart, CartDetail, CartItem, CartItemCreate, CartItemUpdate};
use shared::util::now_millis;
use shared::{AppError, AppResult};
use sqlx::SqlitePool;

use crate::orders::service::CartStore;

pub async fn get_or_create(pool: &SqlitePool, user_id: i64) -> AppResult<Cart> {
    if let Some(cart) = sqlx::query_as::<_, Cart>(
        "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    {
        return Ok(cart);
    }

    let now = now_millis();
    sqlx::query(
        "INSERT INTO carts (user_id, created_at, updated_at) VALUES (?1, ?2, ?2) ON CONFLICT(user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    let cart = sqlx::query_as::<_, Cart>(
        "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(cart)
}

pub async fn items_of(pool: &SqlitePool, cart_id: i64) -> AppResult<Vec<CartItem>> {
    let items = sqlx::query_as::<_, CartItem>(
        "SELECT id, cart_id, meal_id, chef_id, quantity, note, created_at, updated_at FROM cart_items WHERE cart_id = ? ORDER BY id",
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn detail(pool: &SqlitePool, user_id: i64) -> AppResult<CartDetail> {
    let cart = get_or_create(pool, user_id).await?;
    let items = items_of(pool, cart.id).await?;
    Ok(CartDetail { cart, items })
}

pub async fn add_item(
    pool: &SqlitePool,
    cart_id: i64,
    data: CartItemCreate,
) -> AppResult<CartItem> {
    let meal = crate::db::repository::meal::find_by_id(pool, data.meal_id)
        .await?
        .ok_or_else(|| {
            AppError::invalid_request(format!("meal {} does not exist", data.meal_id))
        })?;
    if !meal.is_active {
        return Err(AppError::invalid_request(format!(
            "meal '{}' is not available",
            meal.name
        )));
    }

    let now = now_millis();
    let item_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO cart_items (cart_id, meal_id, chef_id, quantity, note, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) ON CONFLICT(cart_id, meal_id) DO UPDATE SET quantity = quantity + excluded.quantity, note = COALESCE(excluded.note, note), updated_at = excluded.updated_at RETURNING id",
    )
    .bind(cart_id)
    .bind(data.meal_id)
    .bind(meal.chef_id)
    .bind(data.quantity)
    .bind(&data.note)
    .bind(now)
    .fetch_one(pool)
    .await?;

    touch(pool, cart_id, now).await?;

    let item = sqlx::query_as::<_, CartItem>(
        "SELECT id, cart_id, meal_id, chef_id, quantity, note, created_at, updated_at FROM cart_items WHERE id = ?",
    )
    .bind(item_id)
    .fetch_one(pool)
    .await?;
    Ok(item)
}

pub async fn update_item(
    pool: &SqlitePool,
    cart_id: i64,
    item_id: i64,
    data: CartItemUpdate,
) -> AppResult<CartItem> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE cart_items SET quantity = COALESCE(?1, quantity), note = COALESCE(?2, note), updated_at = ?3 WHERE id = ?4 AND cart_id = ?5",
    )
    .bind(data.quantity)
    .bind(&data.note)
    .bind(now)
    .bind(item_id)
    .bind(cart_id)
    .execute(pool)
    .await?
    .rows_affected();

    if rows == 0 {
        return Err(AppError::not_found(format!("cart item {item_id} not found")));
    }
    touch(pool, cart_id, now).await?;

    let item = sqlx::query_as::<_, CartItem>(
        "SELECT id, cart_id, meal_id, chef_id, quantity, note, created_at, updated_at FROM cart_items WHERE id = ?",
    )
    .bind(item_id)
    .fetch_one(pool)
    .await?;
    Ok(item)
}

pub async fn remove_item(pool: &SqlitePool, cart_id: i64, item_id: i64) -> AppResult<()> {
    let rows = sqlx::query("DELETE FROM cart_items WHERE id = ? AND cart_id = ?")
        .bind(item_id)
        .bind(cart_id)
        .execute(pool)
        .await?
        .rows_affected();

    if rows == 0 {
        return Err(AppError::not_found(format!("cart item {item_id} not found")));
    }
    touch(pool, cart_id, now_millis()).await
}

pub async fn clear(pool: &SqlitePool, cart_id: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
        .bind(cart_id)
        .execute(pool)
        .await?;
    touch(pool, cart_id, now_millis()).await
}

async fn touch(pool: &SqlitePool, cart_id: i64, now: i64) -> AppResult<()> {
    sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(cart_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// [`CartStore`] backed by the `carts` tables.
#[derive(Clone)]
pub struct DbCartStore {
    pool: SqlitePool,
}

impl DbCartStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for DbCartStore {
    async fn get(&self, user_id: i64) -> AppResult<Cart> {
        get_or_create(&self.pool, user_id).await
    }

    async fn items_of(&self, cart_id: i64) -> AppResult<Vec<CartItem>> {
        items_of(&self.pool, cart_id).await
    }

    async fn clear(&self, cart_id: i64) -> AppResult<()> {
        clear(&self.pool, cart_id).await
    }
}
