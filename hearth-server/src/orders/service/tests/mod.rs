//! Service tests against in-memory fakes.
//!
//! Every capability trait gets a hand-rolled fake with call logs, so
//! the tests can assert ordering (reserve ascending, release in
//! reverse) and side effects (cart cleared, counters untouched on
//! early failure) without a database.

mod test_lifecycle;

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use rust_decimal::Decimal;
use shared::models::{
    Cart, CartItem, CheckoutItem, CheckoutRequest, DeliveryType, Meal, Order, OrderDetail,
    OrderItem, OrderStatus, PaymentMethod, PaymentStatus, SubOrder, SubOrderDetail,
    SubOrderStatus,
};
use shared::util::now_millis;

use super::*;
use crate::orders::pricing::{FeeBreakdown, ZeroFees};

pub const CART_ID: i64 = 77;

// ========== Fakes ==========

pub struct FakeMeals {
    meals: Mutex<BTreeMap<i64, Meal>>,
    pub reserve_log: Mutex<Vec<(i64, i64)>>,
    pub release_log: Mutex<Vec<(i64, i64)>>,
}

impl FakeMeals {
    pub fn new(meals: Vec<Meal>) -> Self {
        Self {
            meals: Mutex::new(meals.into_iter().map(|m| (m.id, m)).collect()),
            reserve_log: Mutex::new(Vec::new()),
            release_log: Mutex::new(Vec::new()),
        }
    }

    pub fn stock_of(&self, meal_id: i64) -> Option<i64> {
        self.meals
            .lock()
            .unwrap()
            .get(&meal_id)
            .and_then(|m| m.available_quantity)
    }
}

#[async_trait]
impl MealRegistry for FakeMeals {
    async fn snapshot(&self, meal_id: i64) -> AppResult<Option<Meal>> {
        Ok(self.meals.lock().unwrap().get(&meal_id).cloned())
    }

    async fn reserve(&self, meal_id: i64, quantity: i64) -> AppResult<()> {
        let mut meals = self.meals.lock().unwrap();
        let meal = meals
            .get_mut(&meal_id)
            .ok_or_else(|| AppError::meal_unavailable(format!("meal {meal_id} not found")))?;
        if !meal.is_active {
            return Err(AppError::meal_unavailable(format!(
                "meal '{}' is not active",
                meal.name
            )));
        }
        if let Some(available) = meal.available_quantity {
            if available < quantity {
                return Err(AppError::insufficient_stock(format!(
                    "insufficient stock for meal '{}': {available} available, {quantity} requested",
                    meal.name
                )));
            }
            meal.available_quantity = Some(available - quantity);
        }
        self.reserve_log.lock().unwrap().push((meal_id, quantity));
        Ok(())
    }

    async fn release(&self, meal_id: i64, quantity: i64) -> AppResult<()> {
        let mut meals = self.meals.lock().unwrap();
        if let Some(meal) = meals.get_mut(&meal_id)
            && let Some(available) = meal.available_quantity
        {
            meal.available_quantity = Some(available + quantity);
        }
        self.release_log.lock().unwrap().push((meal_id, quantity));
        Ok(())
    }
}

pub struct FakeCarts {
    items: Mutex<Vec<CartItem>>,
    pub clear_calls: AtomicI64,
    fail_clear: bool,
}

impl FakeCarts {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self {
            items: Mutex::new(items),
            clear_calls: AtomicI64::new(0),
            fail_clear: false,
        }
    }

    pub fn failing_clear(items: Vec<CartItem>) -> Self {
        Self {
            fail_clear: true,
            ..Self::new(items)
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

#[async_trait]
impl CartStore for FakeCarts {
    async fn get(&self, user_id: i64) -> AppResult<Cart> {
        let now = now_millis();
        Ok(Cart {
            id: CART_ID,
            user_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn items_of(&self, cart_id: i64) -> AppResult<Vec<CartItem>> {
        assert_eq!(cart_id, CART_ID);
        Ok(self.items.lock().unwrap().clone())
    }

    async fn clear(&self, cart_id: i64) -> AppResult<()> {
        assert_eq!(cart_id, CART_ID);
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_clear {
            return Err(AppError::Persistence("cart store offline".into()));
        }
        self.items.lock().unwrap().clear();
        Ok(())
    }
}

pub struct FakeCodes {
    seq: AtomicI64,
    calls: AtomicI64,
    fail: bool,
}

impl FakeCodes {
    pub fn new() -> Self {
        Self {
            seq: AtomicI64::new(0),
            calls: AtomicI64::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::new() }
    }

    pub fn calls(&self) -> i64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderCodeGenerator for FakeCodes {
    async fn next_order_code(&self, now: DateTime<Utc>) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Persistence("counter table offline".into()));
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("ORD-{}-{seq:03}", now.format("%Y%m%d")))
    }
}

pub struct CreatedAggregate {
    pub order: OrderCreate,
    pub sub_orders: Vec<SubOrderCreate>,
    pub items: Vec<OrderItemCreate>,
}

#[derive(Default)]
pub struct FakeRepo {
    pub created: Mutex<Option<CreatedAggregate>>,
    pub sub_order_response: Mutex<Option<SubOrder>>,
    pub sub_updates: Mutex<Vec<(i64, SubOrderStatus, Option<String>)>>,
    fail_create: bool,
}

impl FakeRepo {
    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl OrderRepository for FakeRepo {
    async fn create_aggregate(
        &self,
        order: OrderCreate,
        sub_orders: Vec<SubOrderCreate>,
        items: Vec<OrderItemCreate>,
    ) -> AppResult<i64> {
        if self.fail_create {
            return Err(AppError::Persistence("order insert failed".into()));
        }
        *self.created.lock().unwrap() = Some(CreatedAggregate {
            order,
            sub_orders,
            items,
        });
        Ok(1)
    }

    async fn find_by_id(&self, order_id: i64) -> AppResult<Option<OrderDetail>> {
        if order_id != 1 {
            return Ok(None);
        }
        let created = self.created.lock().unwrap();
        Ok(created.as_ref().map(detail_from))
    }

    async fn find_by_user(
        &self,
        _user_id: i64,
        _limit: i64,
        _offset: i64,
    ) -> AppResult<Vec<Order>> {
        Ok(Vec::new())
    }

    async fn find_by_chef(
        &self,
        _chef_id: i64,
        _status: Option<SubOrderStatus>,
        _limit: i64,
        _offset: i64,
    ) -> AppResult<Vec<ChefQueueEntry>> {
        Ok(Vec::new())
    }

    async fn find_by_status(
        &self,
        _status: OrderStatus,
        _limit: i64,
        _offset: i64,
    ) -> AppResult<Vec<Order>> {
        Ok(Vec::new())
    }

    async fn find_by_date_range(
        &self,
        _from_millis: i64,
        _to_millis: i64,
        _limit: i64,
        _offset: i64,
    ) -> AppResult<Vec<Order>> {
        Ok(Vec::new())
    }

    async fn find_sub_order(&self, _sub_order_id: i64) -> AppResult<Option<SubOrder>> {
        Ok(self.sub_order_response.lock().unwrap().clone())
    }

    async fn update_sub_order_status(
        &self,
        sub_order_id: i64,
        new_status: SubOrderStatus,
        chef_note: Option<String>,
    ) -> AppResult<SubOrder> {
        self.sub_updates
            .lock()
            .unwrap()
            .push((sub_order_id, new_status, chef_note.clone()));
        match self.sub_order_response.lock().unwrap().as_ref() {
            Some(sub) => {
                let mut sub = sub.clone();
                sub.status = new_status;
                sub.chef_note = chef_note.or(sub.chef_note);
                Ok(sub)
            }
            None => Err(AppError::not_found(format!(
                "sub-order {sub_order_id} not found"
            ))),
        }
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        _new_status: OrderStatus,
    ) -> AppResult<Order> {
        Err(AppError::not_found(format!("order {order_id} not found")))
    }

    async fn cancel(&self, order_id: i64) -> AppResult<Order> {
        Err(AppError::not_found(format!("order {order_id} not found")))
    }
}

/// Synthesize the eager view the real repository would load back.
fn detail_from(agg: &CreatedAggregate) -> OrderDetail {
    let now = now_millis();
    let order = Order {
        id: 1,
        order_code: agg.order.order_code.clone(),
        user_id: agg.order.user_id,
        currency: agg.order.currency.clone(),
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method: agg.order.payment_method,
        delivery_type: agg.order.delivery_type,
        delivery_address: agg.order.delivery_address.clone(),
        latitude: agg.order.latitude,
        longitude: agg.order.longitude,
        note: agg.order.note.clone(),
        subtotal: agg.order.subtotal,
        delivery_fee: agg.order.delivery_fee,
        service_fee: agg.order.service_fee,
        tax: agg.order.tax,
        discount: agg.order.discount,
        total: agg.order.total,
        chef_count: agg.order.chef_count,
        estimated_delivery_at: agg.order.estimated_delivery_at,
        actual_delivery_at: None,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    };
    let sub_orders = agg
        .sub_orders
        .iter()
        .enumerate()
        .map(|(i, sub)| {
            let sub_id = 100 + i as i64;
            let items = agg
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.chef_id == sub.chef_id)
                .map(|(j, item)| OrderItem {
                    id: 1000 + j as i64,
                    order_id: 1,
                    sub_order_id: sub_id,
                    meal_id: item.meal_id,
                    chef_id: item.chef_id,
                    meal_name: item.meal_name.clone(),
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                    line_total: item.line_total,
                    note: item.note.clone(),
                    created_at: now,
                })
                .collect();
            SubOrderDetail {
                sub_order: SubOrder {
                    id: sub_id,
                    order_id: 1,
                    chef_id: sub.chef_id,
                    chef_order_code: sub.chef_order_code.clone(),
                    status: SubOrderStatus::Pending,
                    subtotal: sub.subtotal,
                    delivery_fee: sub.delivery_fee,
                    service_fee: sub.service_fee,
                    total: sub.total,
                    estimated_prep_minutes: sub.estimated_prep_minutes,
                    chef_note: None,
                    created_at: now,
                    updated_at: now,
                },
                items,
            }
        })
        .collect();
    OrderDetail { order, sub_orders }
}

// ========== Builders ==========

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn meal(id: i64, chef_id: i64, price: &str, stock: Option<i64>) -> Meal {
    let now = now_millis();
    Meal {
        id,
        chef_id,
        name: format!("Meal {id}"),
        description: None,
        price: dec(price),
        is_active: true,
        available_quantity: stock,
        daily_limit: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn inactive_meal(id: i64, chef_id: i64, price: &str) -> Meal {
    Meal {
        is_active: false,
        ..meal(id, chef_id, price, None)
    }
}

pub fn cart_item(id: i64, meal_id: i64, chef_id: i64, quantity: i64) -> CartItem {
    let now = now_millis();
    CartItem {
        id,
        cart_id: CART_ID,
        meal_id,
        chef_id,
        quantity,
        note: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn line(meal_id: i64, quantity: i64) -> CheckoutItem {
    CheckoutItem {
        meal_id,
        quantity,
        note: None,
    }
}

pub fn pickup_request(items: Vec<CheckoutItem>) -> CheckoutRequest {
    CheckoutRequest {
        items,
        payment_method: PaymentMethod::Card,
        delivery_type: DeliveryType::Pickup,
        delivery_address: None,
        latitude: None,
        longitude: None,
        note: None,
    }
}

pub fn delivery_request(items: Vec<CheckoutItem>, address: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        items,
        payment_method: PaymentMethod::Online,
        delivery_type: DeliveryType::Delivery,
        delivery_address: address.map(String::from),
        latitude: None,
        longitude: None,
        note: None,
    }
}

// ========== Harness ==========

pub struct Harness {
    pub meals: Arc<FakeMeals>,
    pub carts: Arc<FakeCarts>,
    pub codes: Arc<FakeCodes>,
    pub repo: Arc<FakeRepo>,
    pub service: OrderService,
}

pub fn harness(meals: Vec<Meal>, cart_items: Vec<CartItem>) -> Harness {
    harness_parts(
        FakeMeals::new(meals),
        FakeCarts::new(cart_items),
        FakeCodes::new(),
        FakeRepo::default(),
        Arc::new(ZeroFees),
    )
}

pub fn harness_parts(
    meals: FakeMeals,
    carts: FakeCarts,
    codes: FakeCodes,
    repo: FakeRepo,
    fees: Arc<dyn FeePolicy>,
) -> Harness {
    let meals = Arc::new(meals);
    let carts = Arc::new(carts);
    let codes = Arc::new(codes);
    let repo = Arc::new(repo);
    let service = OrderService::new(
        meals.clone(),
        carts.clone(),
        codes.clone(),
        repo.clone(),
        fees,
        OrderSettings::default(),
    );
    Harness {
        meals,
        carts,
        codes,
        repo,
        service,
    }
}

/// Fixed non-zero fees for asserting the total formula.
pub struct FlatFees;

impl FeePolicy for FlatFees {
    fn fees(&self, _subtotal: Decimal, delivery_type: DeliveryType) -> FeeBreakdown {
        FeeBreakdown {
            delivery_fee: match delivery_type {
                DeliveryType::Delivery => dec("15.00"),
                DeliveryType::Pickup => Decimal::ZERO,
            },
            service_fee: dec("2.50"),
            tax: dec("10.00"),
            discount: dec("5.00"),
        }
    }
}
