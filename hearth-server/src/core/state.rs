use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db;
use crate::db::repository::{DbCartStore, DbMealRegistry, DbOrderRepository};
use crate::orders::{OrderCodeAllocator, OrderService, OrderSettings, ZeroFees};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt: Arc<JwtService>,
    pub order_service: Arc<OrderService>,
}

impl ServerState {
    /// Open the database, run migrations and wire the order pipeline.
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        // 1. Database
        let pool = db::connect(&config.database_path).await?;

        // 2. Services
        let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));
        let order_service = Arc::new(OrderService::new(
            Arc::new(DbMealRegistry::new(pool.clone())),
            Arc::new(DbCartStore::new(pool.clone())),
            Arc::new(OrderCodeAllocator::new(pool.clone(), config.timezone)),
            Arc::new(DbOrderRepository::new(pool.clone())),
            Arc::new(ZeroFees),
            OrderSettings {
                currency: config.currency.clone(),
                default_prep_minutes: config.default_prep_minutes,
                delivery_window_minutes: config.delivery_window_minutes,
            },
        ));

        Ok(Self {
            config: config.clone(),
            pool,
            jwt,
            order_service,
        })
    }
}
