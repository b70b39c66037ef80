//! SQLite repositories
//!
//! Free query functions over a pool, plus the adapter structs that
//! plug them into the order service's capability traits.

pub mod cart;
pub mod meal;
pub mod order;

pub use cart::DbCartStore;
pub use meal::DbMealRegistry;
pub use order::DbOrderRepository;
