//! Shared application state.
//!
//! Handlers receive the storage ports as trait objects, so the same
//! router runs over PostgreSQL in production and over the in-memory
//! adapters in tests.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    db::DbPool,
    stores::{
        BalanceStore, MerchantStore,
        postgres::{PgBalanceStore, PgMerchantStore},
    },
};

/// State shared with all handlers via axum's State extraction.
#[derive(Clone)]
pub struct AppState {
    pub balances: Arc<dyn BalanceStore>,
    pub merchants: Arc<dyn MerchantStore>,
}

impl AppState {
    /// Assemble state over explicit store implementations.
    pub fn new(balances: Arc<dyn BalanceStore>, merchants: Arc<dyn MerchantStore>) -> Self {
        Self {
            balances,
            merchants,
        }
    }

    /// Production wiring: both stores backed by the PostgreSQL pool, with
    /// the configured bounded lock wait.
    pub fn postgres(pool: DbPool, config: &Config) -> Self {
        Self {
            balances: Arc::new(PgBalanceStore::new(
                pool.clone(),
                Duration::from_millis(config.lock_timeout_ms),
            )),
            merchants: Arc::new(PgMerchantStore::new(pool)),
        }
    }
}
