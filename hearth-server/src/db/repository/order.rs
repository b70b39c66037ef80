//! Order repository
//!
//! The aggregate (order, sub-orders, items) is written and advanced in
//! single transactions. Every sub-order transition recomputes the
//! parent status before commit, so readers never observe a parent that
//! disagrees with its slices.

use std::collections::HashMap;

use async_trait::async_trait;
use shared::models::{
    ChefQueueEntry, Order, OrderCreate, OrderDetail, OrderItem, OrderItemCreate, OrderStatus,
    ParseEnumError, SubOrder, SubOrderCreate, SubOrderDetail, SubOrderStatus,
};
use shared::util::now_millis;
use shared::{AppError, AppResult};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::orders::service::OrderRepository;
use crate::orders::status;

fn parse_status<T>(value: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = ParseEnumError>,
{
    value
        .parse()
        .map_err(|e: ParseEnumError| AppError::Persistence(e.to_string()))
}

// ========== Create ==========

/// Insert the whole aggregate in one transaction. Items land on the
/// sub-order whose chef matches their `chef_id`.
pub async fn create_aggregate(
    pool: &SqlitePool,
    order: OrderCreate,
    sub_orders: Vec<SubOrderCreate>,
    items: Vec<OrderItemCreate>,
) -> AppResult<i64> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let order_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO orders (order_code, user_id, currency, status, payment_status,
            payment_method, delivery_type, delivery_address, latitude, longitude, note,
            subtotal, delivery_fee, service_fee, tax, discount, total, chef_count,
            estimated_delivery_at, created_at, updated_at)
        VALUES (?1, ?2, ?3, 'PENDING', 'PENDING', ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18)
        RETURNING id
        "#,
    )
    .bind(&order.order_code)
    .bind(order.user_id)
    .bind(&order.currency)
    .bind(order.payment_method.as_str())
    .bind(order.delivery_type.as_str())
    .bind(&order.delivery_address)
    .bind(order.latitude)
    .bind(order.longitude)
    .bind(&order.note)
    .bind(order.subtotal.to_string())
    .bind(order.delivery_fee.to_string())
    .bind(order.service_fee.to_string())
    .bind(order.tax.to_string())
    .bind(order.discount.to_string())
    .bind(order.total.to_string())
    .bind(order.chef_count)
    .bind(order.estimated_delivery_at)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let mut sub_ids: HashMap<i64, i64> = HashMap::with_capacity(sub_orders.len());
    for sub in &sub_orders {
        let sub_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO sub_orders (order_id, chef_id, chef_order_code, status, subtotal,
                delivery_fee, service_fee, total, estimated_prep_minutes, created_at, updated_at)
            VALUES (?1, ?2, ?3, 'PENDING', ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            RETURNING id
            "#,
        )
        .bind(order_id)
        .bind(sub.chef_id)
        .bind(&sub.chef_order_code)
        .bind(sub.subtotal.to_string())
        .bind(sub.delivery_fee.to_string())
        .bind(sub.service_fee.to_string())
        .bind(sub.total.to_string())
        .bind(sub.estimated_prep_minutes)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        sub_ids.insert(sub.chef_id, sub_id);
    }

    for item in &items {
        let sub_id = sub_ids
            .get(&item.chef_id)
            .copied()
            .ok_or_else(|| AppError::internal(format!("no sub-order for chef {}", item.chef_id)))?;
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, sub_order_id, meal_id, chef_id, meal_name,
                unit_price, quantity, line_total, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(order_id)
        .bind(sub_id)
        .bind(item.meal_id)
        .bind(item.chef_id)
        .bind(&item.meal_name)
        .bind(item.unit_price.to_string())
        .bind(item.quantity)
        .bind(item.line_total.to_string())
        .bind(&item.note)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(order_id)
}

// ========== Queries ==========

pub async fn find_order(pool: &SqlitePool, order_id: i64) -> AppResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT id, order_code, user_id, currency, status, payment_status, payment_method, delivery_type, delivery_address, latitude, longitude, note, subtotal, delivery_fee, service_fee, tax, discount, total, chef_count, estimated_delivery_at, actual_delivery_at, cancelled_at, created_at, updated_at FROM orders WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(order)
}

pub async fn find_by_id(pool: &SqlitePool, order_id: i64) -> AppResult<Option<OrderDetail>> {
    let Some(order) = find_order(pool, order_id).await? else {
        return Ok(None);
    };
    Ok(Some(load_detail(pool, order).await?))
}

async fn load_detail(pool: &SqlitePool, order: Order) -> AppResult<OrderDetail> {
    let sub_orders = sqlx::query_as::<_, SubOrder>(
        "SELECT id, order_id, chef_id, chef_order_code, status, subtotal, delivery_fee, service_fee, total, estimated_prep_minutes, chef_note, created_at, updated_at FROM sub_orders WHERE order_id = ? ORDER BY id",
    )
    .bind(order.id)
    .fetch_all(pool)
    .await?;

    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, sub_order_id, meal_id, chef_id, meal_name, unit_price, quantity, line_total, note, created_at FROM order_items WHERE order_id = ? ORDER BY id",
    )
    .bind(order.id)
    .fetch_all(pool)
    .await?;

    let mut by_sub: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_sub.entry(item.sub_order_id).or_default().push(item);
    }

    let sub_orders = sub_orders
        .into_iter()
        .map(|sub| {
            let items = by_sub.remove(&sub.id).unwrap_or_default();
            SubOrderDetail {
                sub_order: sub,
                items,
            }
        })
        .collect();

    Ok(OrderDetail { order, sub_orders })
}

/// A user's order history, newest first. Summaries only; the detail
/// endpoint materializes sub-orders and items.
pub async fn find_by_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT id, order_code, user_id, currency, status, payment_status, payment_method, delivery_type, delivery_address, latitude, longitude, note, subtotal, delivery_fee, service_fee, tax, discount, total, chef_count, estimated_delivery_at, actual_delivery_at, cancelled_at, created_at, updated_at FROM orders WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// A chef's queue, newest first.
pub async fn find_by_chef(
    pool: &SqlitePool,
    chef_id: i64,
    status: Option<SubOrderStatus>,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<ChefQueueEntry>> {
    let subs = match status {
        Some(status) => {
            sqlx::query_as::<_, SubOrder>(
                "SELECT id, order_id, chef_id, chef_order_code, status, subtotal, delivery_fee, service_fee, total, estimated_prep_minutes, chef_note, created_at, updated_at FROM sub_orders WHERE chef_id = ? AND status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            )
            .bind(chef_id)
            .bind(status.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, SubOrder>(
                "SELECT id, order_id, chef_id, chef_order_code, status, subtotal, delivery_fee, service_fee, total, estimated_prep_minutes, chef_note, created_at, updated_at FROM sub_orders WHERE chef_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            )
            .bind(chef_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };

    let mut entries = Vec::with_capacity(subs.len());
    for sub in subs {
        let order = find_order(pool, sub.order_id)
            .await?
            .ok_or_else(|| AppError::Persistence(format!("order {} missing", sub.order_id)))?;
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, sub_order_id, meal_id, chef_id, meal_name, unit_price, quantity, line_total, note, created_at FROM order_items WHERE sub_order_id = ? ORDER BY id",
        )
        .bind(sub.id)
        .fetch_all(pool)
        .await?;
        entries.push(ChefQueueEntry {
            sub_order: sub,
            order_code: order.order_code,
            delivery_type: order.delivery_type,
            note: order.note,
            items,
        });
    }
    Ok(entries)
}

pub async fn find_by_status(
    pool: &SqlitePool,
    status: OrderStatus,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT id, order_code, user_id, currency, status, payment_status, payment_method, delivery_type, delivery_address, latitude, longitude, note, subtotal, delivery_fee, service_fee, tax, discount, total, chef_count, estimated_delivery_at, actual_delivery_at, cancelled_at, created_at, updated_at FROM orders WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(status.as_str())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// Orders created in `[from_millis, to_millis)`.
pub async fn find_by_date_range(
    pool: &SqlitePool,
    from_millis: i64,
    to_millis: i64,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT id, order_code, user_id, currency, status, payment_status, payment_method, delivery_type, delivery_address, latitude, longitude, note, subtotal, delivery_fee, service_fee, tax, discount, total, chef_count, estimated_delivery_at, actual_delivery_at, cancelled_at, created_at, updated_at FROM orders WHERE created_at >= ? AND created_at < ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(from_millis)
    .bind(to_millis)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

pub async fn find_sub_order(pool: &SqlitePool, sub_order_id: i64) -> AppResult<Option<SubOrder>> {
    let sub = sqlx::query_as::<_, SubOrder>(
        "SELECT id, order_id, chef_id, chef_order_code, status, subtotal, delivery_fee, service_fee, total, estimated_prep_minutes, chef_note, created_at, updated_at FROM sub_orders WHERE id = ?",
    )
    .bind(sub_order_id)
    .fetch_optional(pool)
    .await?;
    Ok(sub)
}

// ========== Transitions ==========

/// Apply a chef-side transition, release stock on cancellation and
/// recompute the parent, all in one transaction.
pub async fn update_sub_order_status(
    pool: &SqlitePool,
    sub_order_id: i64,
    new_status: SubOrderStatus,
    chef_note: Option<String>,
) -> AppResult<SubOrder> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let Some(sub) = sqlx::query_as::<_, SubOrder>(
        "SELECT id, order_id, chef_id, chef_order_code, status, subtotal, delivery_fee, service_fee, total, estimated_prep_minutes, chef_note, created_at, updated_at FROM sub_orders WHERE id = ?",
    )
    .bind(sub_order_id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Err(AppError::not_found(format!(
            "sub-order {sub_order_id} not found"
        )));
    };

    if !status::sub_transition_allowed(sub.status, new_status) {
        return Err(AppError::invalid_transition(sub.status, new_status));
    }

    sqlx::query(
        "UPDATE sub_orders SET status = ?1, chef_note = COALESCE(?2, chef_note), updated_at = ?3 WHERE id = ?4",
    )
    .bind(new_status.as_str())
    .bind(&chef_note)
    .bind(now)
    .bind(sub_order_id)
    .execute(&mut *tx)
    .await?;

    // A cancelled slice hands its reserved stock back.
    if new_status == SubOrderStatus::Cancelled {
        restore_stock_for_sub(&mut tx, sub_order_id, now).await?;
    }

    recompute_parent_status(&mut tx, sub.order_id, now).await?;

    tx.commit().await?;

    find_sub_order(pool, sub_order_id)
        .await?
        .ok_or_else(|| AppError::Persistence(format!("sub-order {sub_order_id} missing")))
}

/// Admin-driven parent transition. Only `Delivering` (once every
/// active slice is ready) and `Delivering -> Delivered` are direct;
/// everything else is derived from the sub-orders.
pub async fn update_order_status(
    pool: &SqlitePool,
    order_id: i64,
    new_status: OrderStatus,
) -> AppResult<Order> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let Some(order) = sqlx::query_as::<_, Order>(
        "SELECT id, order_code, user_id, currency, status, payment_status, payment_method, delivery_type, delivery_address, latitude, longitude, note, subtotal, delivery_fee, service_fee, tax, discount, total, chef_count, estimated_delivery_at, actual_delivery_at, cancelled_at, created_at, updated_at FROM orders WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        return Err(AppError::not_found(format!("order {order_id} not found")));
    };

    match new_status {
        OrderStatus::Delivering => {
            let subs = load_sub_statuses(&mut tx, order_id).await?;
            if !status::can_enter_delivering(order.status, &subs) {
                return Err(AppError::invalid_transition(order.status, new_status));
            }
            sqlx::query("UPDATE orders SET status = 'DELIVERING', updated_at = ?1 WHERE id = ?2")
                .bind(now)
                .bind(order_id)
                .execute(&mut *tx)
                .await?;
        }
        OrderStatus::Delivered if order.status == OrderStatus::Delivering => {
            // Handoff complete: remaining ready slices are delivered
            // together with the parent.
            sqlx::query(
                "UPDATE sub_orders SET status = 'DELIVERED', updated_at = ?1 WHERE order_id = ?2 AND status NOT IN ('DELIVERED', 'CANCELLED')",
            )
            .bind(now)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "UPDATE orders SET status = 'DELIVERED', actual_delivery_at = COALESCE(actual_delivery_at, ?1), updated_at = ?1 WHERE id = ?2",
            )
            .bind(now)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        }
        OrderStatus::Delivered => {
            return Err(AppError::invalid_transition(order.status, new_status));
        }
        OrderStatus::Cancelled => {
            return Err(AppError::InvalidTransition(
                "cancellation goes through the cancel endpoint".into(),
            ));
        }
        _ => {
            return Err(AppError::InvalidTransition(format!(
                "order status {new_status} is derived from sub-orders and cannot be set directly"
            )));
        }
    }

    tx.commit().await?;

    find_order(pool, order_id)
        .await?
        .ok_or_else(|| AppError::Persistence(format!("order {order_id} missing")))
}

/// Cancel the whole aggregate: stock held by still-active slices goes
/// back, every slice is cancelled and the parent is stamped, in one
/// transaction.
pub async fn cancel(pool: &SqlitePool, order_id: i64) -> AppResult<Order> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(current) = current else {
        return Err(AppError::not_found(format!("order {order_id} not found")));
    };
    let current: OrderStatus = parse_status(&current)?;

    if !status::order_cancellable(current) {
        return Err(AppError::not_cancellable(current));
    }

    sqlx::query(
        r#"
        UPDATE meals
        SET available_quantity = available_quantity + (
                SELECT SUM(oi.quantity) FROM order_items oi
                JOIN sub_orders so ON so.id = oi.sub_order_id
                WHERE so.order_id = ?1 AND so.status != 'CANCELLED' AND oi.meal_id = meals.id
            ),
            updated_at = ?2
        WHERE available_quantity IS NOT NULL
          AND id IN (
                SELECT oi.meal_id FROM order_items oi
                JOIN sub_orders so ON so.id = oi.sub_order_id
                WHERE so.order_id = ?1 AND so.status != 'CANCELLED'
            )
        "#,
    )
    .bind(order_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE sub_orders SET status = 'CANCELLED', updated_at = ?1 WHERE order_id = ?2 AND status != 'CANCELLED'",
    )
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE orders SET status = 'CANCELLED', cancelled_at = ?1, updated_at = ?1 WHERE id = ?2",
    )
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_order(pool, order_id)
        .await?
        .ok_or_else(|| AppError::Persistence(format!("order {order_id} missing")))
}

// ========== Transaction helpers ==========

/// Give a cancelled slice's reserved quantities back to the meals that
/// track stock.
async fn restore_stock_for_sub(
    tx: &mut Transaction<'_, Sqlite>,
    sub_order_id: i64,
    now: i64,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE meals
        SET available_quantity = available_quantity + (
                SELECT SUM(oi.quantity) FROM order_items oi
                WHERE oi.sub_order_id = ?1 AND oi.meal_id = meals.id
            ),
            updated_at = ?2
        WHERE available_quantity IS NOT NULL
          AND id IN (SELECT meal_id FROM order_items WHERE sub_order_id = ?1)
        "#,
    )
    .bind(sub_order_id)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn load_sub_statuses(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: i64,
) -> AppResult<Vec<SubOrderStatus>> {
    let raw: Vec<String> =
        sqlx::query_scalar("SELECT status FROM sub_orders WHERE order_id = ? ORDER BY id")
            .bind(order_id)
            .fetch_all(&mut **tx)
            .await?;
    let mut subs = Vec::with_capacity(raw.len());
    for value in raw {
        subs.push(parse_status(&value)?);
    }
    Ok(subs)
}

/// Re-derive the parent status from its slices inside the transaction
/// that changed them. Delivered and cancelled stamps are set at most
/// once.
async fn recompute_parent_status(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: i64,
    now: i64,
) -> AppResult<()> {
    let current: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_one(&mut **tx)
        .await?;
    let current: OrderStatus = parse_status(&current)?;
    let subs = load_sub_statuses(tx, order_id).await?;

    let next = status::recompute_parent(current, &subs);
    if next == current {
        sqlx::query("UPDATE orders SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(order_id)
            .execute(&mut **tx)
            .await?;
        return Ok(());
    }

    match next {
        OrderStatus::Delivered => {
            sqlx::query(
                "UPDATE orders SET status = ?1, actual_delivery_at = COALESCE(actual_delivery_at, ?2), updated_at = ?2 WHERE id = ?3",
            )
            .bind(next.as_str())
            .bind(now)
            .bind(order_id)
            .execute(&mut **tx)
            .await?;
        }
        OrderStatus::Cancelled => {
            sqlx::query(
                "UPDATE orders SET status = ?1, cancelled_at = COALESCE(cancelled_at, ?2), updated_at = ?2 WHERE id = ?3",
            )
            .bind(next.as_str())
            .bind(now)
            .bind(order_id)
            .execute(&mut **tx)
            .await?;
        }
        _ => {
            sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(next.as_str())
                .bind(now)
                .bind(order_id)
                .execute(&mut **tx)
                .await?;
        }
    }
    Ok(())
}

// ========== Adapter ==========

/// [`OrderRepository`] backed by the order tables.
#[derive(Clone)]
pub struct DbOrderRepository {
    pool: SqlitePool,
}

impl DbOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for DbOrderRepository {
    async fn create_aggregate(
        &self,
        order: OrderCreate,
        sub_orders: Vec<SubOrderCreate>,
        items: Vec<OrderItemCreate>,
    ) -> AppResult<i64> {
        create_aggregate(&self.pool, order, sub_orders, items).await
    }

    async fn find_by_id(&self, order_id: i64) -> AppResult<Option<OrderDetail>> {
        find_by_id(&self.pool, order_id).await
    }

    async fn find_by_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>> {
        find_by_user(&self.pool, user_id, limit, offset).await
    }

    async fn find_by_chef(
        &self,
        chef_id: i64,
        status: Option<SubOrderStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ChefQueueEntry>> {
        find_by_chef(&self.pool, chef_id, status, limit, offset).await
    }

    async fn find_by_status(
        &self,
        status: OrderStatus,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>> {
        find_by_status(&self.pool, status, limit, offset).await
    }

    async fn find_by_date_range(
        &self,
        from_millis: i64,
        to_millis: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>> {
        find_by_date_range(&self.pool, from_millis, to_millis, limit, offset).await
    }

    async fn find_sub_order(&self, sub_order_id: i64) -> AppResult<Option<SubOrder>> {
        find_sub_order(&self.pool, sub_order_id).await
    }

    async fn update_sub_order_status(
        &self,
        sub_order_id: i64,
        new_status: SubOrderStatus,
        chef_note: Option<String>,
    ) -> AppResult<SubOrder> {
        update_sub_order_status(&self.pool, sub_order_id, new_status, chef_note).await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatus,
    ) -> AppResult<Order> {
        update_order_status(&self.pool, order_id, new_status).await
    }

    async fn cancel(&self, order_id: i64) -> AppResult<Order> {
        cancel(&self.pool, order_id).await
    }
}
