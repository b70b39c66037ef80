use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A dish offered by a single chef.
///
/// `available_quantity` is the managed stock counter. `None` means the
/// meal is made to order and quantity is never tracked or decremented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    /// Owning chef. Every order line for this meal lands on that
    /// chef's sub-order.
    pub chef_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Inactive meals stay visible in history but reject new orders.
    pub is_active: bool,
    pub available_quantity: Option<i64>,
    /// Advisory per-day portion cap set by the chef; not enforced by
    /// the order pipeline.
    pub daily_limit: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Meal {
    /// Whether `quantity` units can currently be ordered.
    pub fn can_supply(&self, quantity: i64) -> bool {
        if !self.is_active {
            return false;
        }
        match self.available_quantity {
            Some(available) => available >= quantity,
            None => true,
        }
    }
}

#[cfg(feature = "db")]
impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for Meal {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;

        use super::row::decimal_column;

        Ok(Self {
            id: row.try_get("id")?,
            chef_id: row.try_get("chef_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: decimal_column(row, "price")?,
            is_active: row.try_get("is_active")?,
            available_quantity: row.try_get("available_quantity")?,
            daily_limit: row.try_get("daily_limit")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(is_active: bool, available_quantity: Option<i64>) -> Meal {
        Meal {
            id: 1,
            chef_id: 10,
            name: "Lentil soup".to_string(),
            description: None,
            price: Decimal::new(4550, 2),
            is_active,
            available_quantity,
            daily_limit: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn unmanaged_stock_always_supplies() {
        assert!(meal(true, None).can_supply(1));
        assert!(meal(true, None).can_supply(500));
    }

    #[test]
    fn managed_stock_checks_the_counter() {
        assert!(meal(true, Some(3)).can_supply(3));
        assert!(!meal(true, Some(3)).can_supply(4));
    }

    #[test]
    fn inactive_meal_never_supplies() {
        assert!(!meal(false, None).can_supply(1));
        assert!(!meal(false, Some(10)).can_supply(1));
    }
}
