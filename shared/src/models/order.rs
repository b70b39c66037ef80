use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ========== Enums ==========

/// Raised when a short status string from the database or a query
/// parameter does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Lifecycle of a parent order.
///
/// Derived from the sub-orders except for `Delivering`, which only an
/// admin sets on the parent once every active sub-order is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Delivering => "DELIVERING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PREPARING" => Ok(Self::Preparing),
            "READY" => Ok(Self::Ready),
            "DELIVERING" => Ok(Self::Delivering),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ParseEnumError {
                kind: "OrderStatus",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle of a single chef's slice of an order.
///
/// No `Delivering` here: delivery happens at the whole-order level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubOrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl SubOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for SubOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubOrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PREPARING" => Ok(Self::Preparing),
            "READY" => Ok(Self::Ready),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ParseEnumError {
                kind: "SubOrderStatus",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Online => "ONLINE",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(Self::Cash),
            "CARD" => Ok(Self::Card),
            "ONLINE" => Ok(Self::Online),
            other => Err(ParseEnumError {
                kind: "PaymentMethod",
                value: other.to_string(),
            }),
        }
    }
}

/// Recorded at checkout and updated by the payment flow. Order status
/// transitions never read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(ParseEnumError {
                kind: "PaymentStatus",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    Pickup,
    Delivery,
}

impl DeliveryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "PICKUP",
            Self::Delivery => "DELIVERY",
        }
    }
}

impl std::fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PICKUP" => Ok(Self::Pickup),
            "DELIVERY" => Ok(Self::Delivery),
            other => Err(ParseEnumError {
                kind: "DeliveryType",
                value: other.to_string(),
            }),
        }
    }
}

// ========== Entities ==========

/// A customer order spanning one or more chefs.
///
/// Money fields are snapshots taken at checkout; later price changes
/// on the meals never touch an existing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Human-facing code, `ORD-YYYYMMDD-NNN` in the configured
    /// timezone. Unique across all orders.
    pub order_code: String,
    pub user_id: i64,
    /// ISO 4217 platform currency, recorded per order.
    pub currency: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
    /// Sum of all line totals before fees.
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    /// subtotal + delivery_fee + service_fee + tax - discount.
    pub total: Decimal,
    /// Cached `sub_orders.len()`; one sub-order per distinct chef.
    pub chef_count: i64,
    pub estimated_delivery_at: Option<i64>,
    /// Stamped exactly once, when the order first reaches `Delivered`.
    pub actual_delivery_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One chef's slice of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubOrder {
    pub id: i64,
    pub order_id: i64,
    pub chef_id: i64,
    /// `<parent code>-CHEF<chef_id>`. Unique across all sub-orders.
    pub chef_order_code: String,
    pub status: SubOrderStatus,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    /// subtotal + delivery_fee + service_fee, scoped to this slice.
    pub total: Decimal,
    pub estimated_prep_minutes: i64,
    pub chef_note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A single meal line. Name and unit price are copied from the meal at
/// checkout so the receipt survives menu edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    /// Parent order, denormalized for whole-order queries.
    pub order_id: i64,
    pub sub_order_id: i64,
    pub meal_id: i64,
    /// Copied from the meal at checkout; always equals the owning
    /// sub-order's chef.
    pub chef_id: i64,
    pub meal_name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub line_total: Decimal,
    pub note: Option<String>,
    pub created_at: i64,
}

#[cfg(feature = "db")]
impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for Order {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;

        use super::row::{decimal_column, enum_column};

        Ok(Self {
            id: row.try_get("id")?,
            order_code: row.try_get("order_code")?,
            user_id: row.try_get("user_id")?,
            currency: row.try_get("currency")?,
            status: enum_column(row, "status")?,
            payment_status: enum_column(row, "payment_status")?,
            payment_method: enum_column(row, "payment_method")?,
            delivery_type: enum_column(row, "delivery_type")?,
            delivery_address: row.try_get("delivery_address")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            note: row.try_get("note")?,
            subtotal: decimal_column(row, "subtotal")?,
            delivery_fee: decimal_column(row, "delivery_fee")?,
            service_fee: decimal_column(row, "service_fee")?,
            tax: decimal_column(row, "tax")?,
            discount: decimal_column(row, "discount")?,
            total: decimal_column(row, "total")?,
            chef_count: row.try_get("chef_count")?,
            estimated_delivery_at: row.try_get("estimated_delivery_at")?,
            actual_delivery_at: row.try_get("actual_delivery_at")?,
            cancelled_at: row.try_get("cancelled_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(feature = "db")]
impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for SubOrder {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;

        use super::row::{decimal_column, enum_column};

        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            chef_id: row.try_get("chef_id")?,
            chef_order_code: row.try_get("chef_order_code")?,
            status: enum_column(row, "status")?,
            subtotal: decimal_column(row, "subtotal")?,
            delivery_fee: decimal_column(row, "delivery_fee")?,
            service_fee: decimal_column(row, "service_fee")?,
            total: decimal_column(row, "total")?,
            estimated_prep_minutes: row.try_get("estimated_prep_minutes")?,
            chef_note: row.try_get("chef_note")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(feature = "db")]
impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for OrderItem {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;

        use super::row::decimal_column;

        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            sub_order_id: row.try_get("sub_order_id")?,
            meal_id: row.try_get("meal_id")?,
            chef_id: row.try_get("chef_id")?,
            meal_name: row.try_get("meal_name")?,
            unit_price: decimal_column(row, "unit_price")?,
            quantity: row.try_get("quantity")?,
            line_total: decimal_column(row, "line_total")?,
            note: row.try_get("note")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

// ========== Payloads ==========

/// One requested line at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub meal_id: i64,
    pub quantity: i64,
    pub note: Option<String>,
}

/// Checkout request body. When `items` is empty the caller's cart
/// contents are used instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    pub payment_method: PaymentMethod,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
}

/// Admin request to move a parent order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Chef or admin request to move a sub-order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubOrderStatusUpdate {
    pub status: SubOrderStatus,
    pub chef_note: Option<String>,
}

// ========== Insert payloads ==========

/// Field set for inserting the parent row of an aggregate.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub order_code: String,
    pub user_id: i64,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub chef_count: i64,
    pub estimated_delivery_at: Option<i64>,
}

/// Field set for inserting one chef's sub-order.
#[derive(Debug, Clone)]
pub struct SubOrderCreate {
    pub chef_id: i64,
    pub chef_order_code: String,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
    pub estimated_prep_minutes: i64,
}

/// Field set for inserting one item line. `chef_id` routes the line to
/// the sub-order of the matching chef.
#[derive(Debug, Clone)]
pub struct OrderItemCreate {
    pub chef_id: i64,
    pub meal_id: i64,
    pub meal_name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub line_total: Decimal,
    pub note: Option<String>,
}

// ========== Views ==========

/// Sub-order plus its item lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubOrderDetail {
    #[serde(flatten)]
    pub sub_order: SubOrder,
    pub items: Vec<OrderItem>,
}

/// Fully loaded order aggregate: parent, sub-orders and items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub sub_orders: Vec<SubOrderDetail>,
}

/// A chef's work queue entry: their sub-order with enough parent
/// context to prepare and hand off the food.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChefQueueEntry {
    #[serde(flatten)]
    pub sub_order: SubOrder,
    pub order_code: String,
    pub delivery_type: DeliveryType,
    pub note: Option<String>,
    pub items: Vec<OrderItem>,
}
