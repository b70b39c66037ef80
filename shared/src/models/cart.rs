use serde::{Deserialize, Serialize};

/// A user's cart. One active cart per user, created on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A line in a cart. Prices are not stored here; they are snapshotted
/// from the meal at checkout time. `chef_id` is copied from the meal
/// when the line is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub meal_id: i64,
    pub chef_id: i64,
    pub quantity: i64,
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Payload for adding a meal to the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemCreate {
    pub meal_id: i64,
    pub quantity: i64,
    pub note: Option<String>,
}

/// Payload for changing an existing cart line. Absent fields keep
/// their current value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemUpdate {
    pub quantity: Option<i64>,
    pub note: Option<String>,
}

/// Cart plus its lines, as returned by the cart endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDetail {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartItem>,
}
