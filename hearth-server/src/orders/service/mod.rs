//! Order pipeline service
//!
//! Owns checkout, status transitions and cancellation on top of four
//! narrow capability seams:
//!
//! | Trait | Responsibility |
//! |-------|----------------|
//! | [`MealRegistry`] | meal snapshots, stock reserve/release |
//! | [`CartStore`] | per-user cart lines |
//! | [`OrderCodeGenerator`] | daily order code sequence |
//! | [`OrderRepository`] | aggregate persistence and queries |
//!
//! Production wires the SQLite-backed implementations from
//! [`crate::db::repository`]; tests substitute in-memory fakes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{
    Cart, CartItem, CheckoutItem, CheckoutRequest, ChefQueueEntry, DeliveryType, Meal, Order,
    OrderCreate, OrderDetail, OrderItemCreate, OrderStatus, SubOrder, SubOrderCreate,
    SubOrderStatus,
};
use shared::{AppError, AppResult};

use crate::orders::money::{MAX_QUANTITY, line_total, round_money};
use crate::orders::pricing::{FeePolicy, order_total};
use crate::utils::validation::{MAX_ADDRESS_LEN, MAX_NOTE_LEN, validate_optional_text};

#[cfg(test)]
mod tests;

// ========== Capability traits ==========

/// Read and reservation access to the meal catalog.
///
/// `reserve` and `release` must be atomic per meal id: two concurrent
/// reserves may never both succeed when stock covers only one of them.
#[async_trait]
pub trait MealRegistry: Send + Sync {
    /// Full snapshot of one meal, `None` when the id is unknown.
    async fn snapshot(&self, meal_id: i64) -> AppResult<Option<Meal>>;

    /// Take `quantity` units of managed stock.
    ///
    /// No-op success for meals without managed stock. Fails with
    /// `MealUnavailable` when the meal is missing or inactive and
    /// `InsufficientStock` when the counter cannot cover the request.
    async fn reserve(&self, meal_id: i64, quantity: i64) -> AppResult<()>;

    /// Return `quantity` units of managed stock. No-op for meals
    /// without managed stock.
    async fn release(&self, meal_id: i64, quantity: i64) -> AppResult<()>;

    async fn price_of(&self, meal_id: i64) -> AppResult<Option<Decimal>> {
        Ok(self.snapshot(meal_id).await?.map(|m| m.price))
    }

    async fn chef_of(&self, meal_id: i64) -> AppResult<Option<i64>> {
        Ok(self.snapshot(meal_id).await?.map(|m| m.chef_id))
    }

    async fn is_active(&self, meal_id: i64) -> AppResult<bool> {
        Ok(self.snapshot(meal_id).await?.is_some_and(|m| m.is_active))
    }

    async fn available(&self, meal_id: i64, quantity: i64) -> AppResult<bool> {
        Ok(self
            .snapshot(meal_id)
            .await?
            .is_some_and(|m| m.can_supply(quantity)))
    }
}

/// Per-user cart access.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart, created on first access.
    async fn get(&self, user_id: i64) -> AppResult<Cart>;

    /// Cart lines in insertion order.
    async fn items_of(&self, cart_id: i64) -> AppResult<Vec<CartItem>>;

    /// Drop every line of the cart.
    async fn clear(&self, cart_id: i64) -> AppResult<()>;
}

/// Order code allocation.
#[async_trait]
pub trait OrderCodeGenerator: Send + Sync {
    /// Next `ORD-YYYYMMDD-NNN` code for the business day containing
    /// `now`. Codes are unique and the per-day sequence never repeats,
    /// even under concurrent allocation.
    async fn next_order_code(&self, now: DateTime<Utc>) -> AppResult<String>;

    /// Code of one chef's slice, derived from the parent code.
    fn sub_order_code(&self, parent: &str, chef_id: i64) -> String {
        format!("{parent}-CHEF{chef_id}")
    }
}

/// Persistence for the order aggregate.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert parent, sub-orders and items in one transaction. Each
    /// item lands on the sub-order whose chef matches. Returns the new
    /// order id.
    async fn create_aggregate(
        &self,
        order: OrderCreate,
        sub_orders: Vec<SubOrderCreate>,
        items: Vec<OrderItemCreate>,
    ) -> AppResult<i64>;

    /// Eager-load one aggregate: parent, sub-orders, items.
    async fn find_by_id(&self, order_id: i64) -> AppResult<Option<OrderDetail>>;

    /// A user's order history, newest first. Summaries only; callers
    /// follow up with `find_by_id` for sub-orders and items.
    async fn find_by_user(&self, user_id: i64, limit: i64, offset: i64) -> AppResult<Vec<Order>>;

    /// A chef's queue, newest first, optionally filtered by sub-order
    /// status.
    async fn find_by_chef(
        &self,
        chef_id: i64,
        status: Option<SubOrderStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ChefQueueEntry>>;

    async fn find_by_status(
        &self,
        status: OrderStatus,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>>;

    /// Orders created in `[from_millis, to_millis)`.
    async fn find_by_date_range(
        &self,
        from_millis: i64,
        to_millis: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>>;

    async fn find_sub_order(&self, sub_order_id: i64) -> AppResult<Option<SubOrder>>;

    /// Apply a chef-side transition and recompute the parent status in
    /// the same transaction. Cancelling releases the slice's stock.
    async fn update_sub_order_status(
        &self,
        sub_order_id: i64,
        new_status: SubOrderStatus,
        chef_note: Option<String>,
    ) -> AppResult<SubOrder>;

    /// Admin-driven parent transition (`Delivering`, then
    /// `Delivered`). Derived statuses cannot be set directly.
    async fn update_order_status(&self, order_id: i64, new_status: OrderStatus)
    -> AppResult<Order>;

    /// Cancel the whole aggregate and restore its stock in one
    /// transaction.
    async fn cancel(&self, order_id: i64) -> AppResult<Order>;
}

// ========== Service ==========

/// Checkout tunables: the platform currency stamped on every order
/// and the estimate defaults.
#[derive(Debug, Clone)]
pub struct OrderSettings {
    pub currency: String,
    pub default_prep_minutes: i64,
    pub delivery_window_minutes: i64,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            currency: "TRY".to_string(),
            default_prep_minutes: 30,
            delivery_window_minutes: 60,
        }
    }
}

#[derive(Default)]
struct ChefPartition {
    subtotal: Decimal,
    items: Vec<OrderItemCreate>,
}

/// The order pipeline: checkout, lifecycle and queries.
pub struct OrderService {
    meals: Arc<dyn MealRegistry>,
    carts: Arc<dyn CartStore>,
    codes: Arc<dyn OrderCodeGenerator>,
    repo: Arc<dyn OrderRepository>,
    fees: Arc<dyn FeePolicy>,
    settings: OrderSettings,
}

impl OrderService {
    pub fn new(
        meals: Arc<dyn MealRegistry>,
        carts: Arc<dyn CartStore>,
        codes: Arc<dyn OrderCodeGenerator>,
        repo: Arc<dyn OrderRepository>,
        fees: Arc<dyn FeePolicy>,
        settings: OrderSettings,
    ) -> Self {
        Self {
            meals,
            carts,
            codes,
            repo,
            fees,
            settings,
        }
    }

    // ========== Checkout ==========

    /// Place an order.
    ///
    /// Items come from the request body, falling back to the user's
    /// cart when the body carries none. Prices are snapshotted from
    /// the catalog at this moment; the items are partitioned into one
    /// sub-order per distinct chef. Stock is reserved per meal in
    /// ascending id order and released in reverse if anything later
    /// fails, surfacing the original error. The cart is cleared after
    /// commit on a best-effort basis.
    pub async fn checkout(&self, user_id: i64, req: CheckoutRequest) -> AppResult<OrderDetail> {
        if user_id <= 0 {
            return Err(AppError::invalid_request("user_id must be positive"));
        }

        let cart = self.carts.get(user_id).await?;
        let lines: Vec<CheckoutItem> = if req.items.is_empty() {
            self.carts
                .items_of(cart.id)
                .await?
                .into_iter()
                .map(|item| CheckoutItem {
                    meal_id: item.meal_id,
                    quantity: item.quantity,
                    note: item.note,
                })
                .collect()
        } else {
            req.items.clone()
        };

        if lines.is_empty() {
            return Err(AppError::invalid_request("order must contain at least one item"));
        }

        // Validation pass: first violation wins, named by field.
        let mut snapshots: Vec<(CheckoutItem, Meal)> = Vec::with_capacity(lines.len());
        for (idx, line) in lines.into_iter().enumerate() {
            if line.quantity < 1 {
                return Err(AppError::invalid_request(format!(
                    "items[{idx}].quantity must be at least 1"
                )));
            }
            if line.quantity > MAX_QUANTITY {
                return Err(AppError::invalid_request(format!(
                    "items[{idx}].quantity exceeds maximum ({MAX_QUANTITY})"
                )));
            }
            validate_optional_text(&line.note, &format!("items[{idx}].note"), MAX_NOTE_LEN)?;

            let meal = self.meals.snapshot(line.meal_id).await?.ok_or_else(|| {
                AppError::invalid_request(format!(
                    "items[{idx}].meal_id references unknown meal {}",
                    line.meal_id
                ))
            })?;
            if !meal.is_active {
                return Err(AppError::invalid_request(format!(
                    "items[{idx}].meal_id references inactive meal '{}'",
                    meal.name
                )));
            }
            snapshots.push((line, meal));
        }

        if req.delivery_type == DeliveryType::Delivery {
            match &req.delivery_address {
                Some(addr) if !addr.trim().is_empty() => {
                    if addr.len() > MAX_ADDRESS_LEN {
                        return Err(AppError::invalid_request(format!(
                            "delivery_address is too long ({} chars, max {MAX_ADDRESS_LEN})",
                            addr.len()
                        )));
                    }
                }
                _ => {
                    return Err(AppError::invalid_request(
                        "delivery_address is required for delivery orders",
                    ));
                }
            }
        }
        validate_optional_text(&req.note, "note", MAX_NOTE_LEN)?;

        // Snapshot pricing and partition by chef.
        let mut subtotal = Decimal::ZERO;
        let mut partitions: BTreeMap<i64, ChefPartition> = BTreeMap::new();
        for (line, meal) in &snapshots {
            let total = line_total(meal.price, line.quantity);
            subtotal += total;
            let partition = partitions.entry(meal.chef_id).or_default();
            partition.subtotal += total;
            partition.items.push(OrderItemCreate {
                chef_id: meal.chef_id,
                meal_id: meal.id,
                meal_name: meal.name.clone(),
                unit_price: meal.price,
                quantity: line.quantity,
                line_total: total,
                note: line.note.clone(),
            });
        }
        let subtotal = round_money(subtotal);
        let fees = self.fees.fees(subtotal, req.delivery_type);
        let total = order_total(subtotal, &fees);

        // Reserve per distinct meal, ascending id.
        let mut plan: BTreeMap<i64, i64> = BTreeMap::new();
        for (line, meal) in &snapshots {
            *plan.entry(meal.id).or_insert(0) += line.quantity;
        }

        let mut reserved: Vec<(i64, i64)> = Vec::with_capacity(plan.len());
        for (&meal_id, &quantity) in &plan {
            match self.meals.reserve(meal_id, quantity).await {
                Ok(()) => reserved.push((meal_id, quantity)),
                Err(err) => {
                    self.unwind_reservations(&reserved).await;
                    return Err(err);
                }
            }
        }

        let now = Utc::now();
        let order_code = match self.codes.next_order_code(now).await {
            Ok(code) => code,
            Err(err) => {
                self.unwind_reservations(&reserved).await;
                return Err(err);
            }
        };

        let estimated_delivery_at = match req.delivery_type {
            DeliveryType::Delivery => Some(
                (now + chrono::Duration::minutes(self.settings.delivery_window_minutes))
                    .timestamp_millis(),
            ),
            DeliveryType::Pickup => None,
        };

        let order = OrderCreate {
            order_code: order_code.clone(),
            user_id,
            currency: self.settings.currency.clone(),
            payment_method: req.payment_method,
            delivery_type: req.delivery_type,
            delivery_address: req.delivery_address.clone(),
            latitude: req.latitude,
            longitude: req.longitude,
            note: req.note.clone(),
            subtotal,
            delivery_fee: fees.delivery_fee,
            service_fee: fees.service_fee,
            tax: fees.tax,
            discount: fees.discount,
            total,
            chef_count: partitions.len() as i64,
            estimated_delivery_at,
        };

        let mut sub_orders = Vec::with_capacity(partitions.len());
        let mut items = Vec::new();
        for (chef_id, partition) in partitions {
            let sub_subtotal = round_money(partition.subtotal);
            // Each slice carries its own delivery and service charge so
            // a chef's payout can be settled without the parent.
            let sub_fees = self.fees.fees(sub_subtotal, req.delivery_type);
            sub_orders.push(SubOrderCreate {
                chef_id,
                chef_order_code: self.codes.sub_order_code(&order_code, chef_id),
                subtotal: sub_subtotal,
                delivery_fee: sub_fees.delivery_fee,
                service_fee: sub_fees.service_fee,
                total: round_money(sub_subtotal + sub_fees.delivery_fee + sub_fees.service_fee),
                estimated_prep_minutes: self.settings.default_prep_minutes,
            });
            items.extend(partition.items);
        }

        let order_id = match self.repo.create_aggregate(order, sub_orders, items).await {
            Ok(id) => id,
            Err(err) => {
                self.unwind_reservations(&reserved).await;
                return Err(err);
            }
        };

        // Best-effort: a failed clear never fails the checkout.
        if let Err(err) = self.carts.clear(cart.id).await {
            tracing::warn!(
                order_id,
                cart_id = cart.id,
                error = %err,
                "failed to clear cart after checkout"
            );
        }

        let detail = self
            .repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::internal(format!("order {order_id} vanished after create")))?;

        tracing::info!(
            order_id,
            order_code = %detail.order.order_code,
            chef_count = detail.sub_orders.len(),
            total = %detail.order.total,
            "order created"
        );

        Ok(detail)
    }

    /// Release successful reservations in reverse order. Failures are
    /// logged and skipped so the remaining releases still run.
    async fn unwind_reservations(&self, reserved: &[(i64, i64)]) {
        for &(meal_id, quantity) in reserved.iter().rev() {
            if let Err(err) = self.meals.release(meal_id, quantity).await {
                tracing::error!(
                    meal_id,
                    quantity,
                    error = %err,
                    "failed to release stock during checkout rollback"
                );
            }
        }
    }

    // ========== Lifecycle ==========

    /// Chef-side transition of one sub-order; the parent status is
    /// recomputed in the same transaction.
    pub async fn advance_sub_order(
        &self,
        sub_order_id: i64,
        new_status: SubOrderStatus,
        chef_note: Option<String>,
    ) -> AppResult<SubOrder> {
        validate_optional_text(&chef_note, "chef_note", MAX_NOTE_LEN)?;
        let sub = self
            .repo
            .update_sub_order_status(sub_order_id, new_status, chef_note)
            .await?;
        tracing::info!(
            sub_order_id,
            order_id = sub.order_id,
            status = %sub.status,
            "sub-order status changed"
        );
        Ok(sub)
    }

    /// Admin-driven parent transition.
    pub async fn advance_order(&self, order_id: i64, new_status: OrderStatus) -> AppResult<Order> {
        let order = self.repo.update_order_status(order_id, new_status).await?;
        tracing::info!(order_id, status = %order.status, "order status changed");
        Ok(order)
    }

    /// Cancel a whole order: releases stock, cancels every sub-order
    /// and stamps cancelled-at, all in one transaction.
    pub async fn cancel_order(&self, order_id: i64) -> AppResult<Order> {
        let order = self.repo.cancel(order_id).await?;
        tracing::info!(order_id, order_code = %order.order_code, "order cancelled");
        Ok(order)
    }

    // ========== Queries ==========

    pub async fn order_detail(&self, order_id: i64) -> AppResult<OrderDetail> {
        self.repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("order {order_id} not found")))
    }

    pub async fn orders_of_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>> {
        self.repo.find_by_user(user_id, limit, offset).await
    }

    pub async fn chef_queue(
        &self,
        chef_id: i64,
        status: Option<SubOrderStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ChefQueueEntry>> {
        self.repo.find_by_chef(chef_id, status, limit, offset).await
    }

    pub async fn orders_by_status(
        &self,
        status: OrderStatus,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>> {
        self.repo.find_by_status(status, limit, offset).await
    }

    pub async fn orders_in_range(
        &self,
        from_millis: i64,
        to_millis: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>> {
        self.repo
            .find_by_date_range(from_millis, to_millis, limit, offset)
            .await
    }

    pub async fn sub_order(&self, sub_order_id: i64) -> AppResult<SubOrder> {
        self.repo
            .find_sub_order(sub_order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("sub-order {sub_order_id} not found")))
    }
}
