//! Order domain
//!
//! Everything between the HTTP surface and the database that concerns
//! orders lives here:
//!
//! - [`service`]: the pipeline itself plus its capability traits
//! - [`status`]: the status machine for sub-orders and parents
//! - [`pricing`]: fee policy applied on top of the item subtotal
//! - [`money`]: rounding and line arithmetic
//! - [`codes`]: daily `ORD-YYYYMMDD-NNN` allocation

pub mod codes;
pub mod money;
pub mod pricing;
pub mod service;
pub mod status;

pub use codes::OrderCodeAllocator;
pub use pricing::{FeeBreakdown, FeePolicy, ZeroFees};
pub use service::{
    CartStore, MealRegistry, OrderCodeGenerator, OrderRepository, OrderService, OrderSettings,
};
