//! Domain models
//!
//! | Module | Contents |
//! |--------|----------|
//! | `meal` | [`Meal`] and its stock helper |
//! | `cart` | [`Cart`], [`CartItem`] and cart payloads |
//! | `order` | Order aggregate, status enums, payloads and views |
//!
//! All timestamps are Unix milliseconds (UTC). All money is
//! [`rust_decimal::Decimal`], stored as TEXT and serialized as a JSON
//! number. Statuses are closed enums persisted as short upper-case
//! strings.

mod cart;
mod meal;
mod order;
#[cfg(feature = "db")]
pub(crate) mod row;

pub use cart::*;
pub use meal::*;
pub use order::*;
