use std::sync::Arc;

use axum_test::TestServer;
use card_authorizer::{
    routes,
    state::AppState,
    stores::{
        BalanceStore,
        memory::{InMemoryBalanceStore, InMemoryMerchantStore},
    },
};

/// The real router over in-memory stores, plus direct handles to the
/// stores for assertions against persisted state.
pub struct TestApp {
    pub server: TestServer,
    pub balances: Arc<InMemoryBalanceStore>,
    pub merchants: Arc<InMemoryMerchantStore>,
}

pub fn spawn_app() -> TestApp {
    let balances = Arc::new(InMemoryBalanceStore::new());
    let merchants = Arc::new(InMemoryMerchantStore::new());

    let state = AppState::new(balances.clone(), merchants.clone());
    let server = TestServer::new(routes::build_router(state));

    TestApp {
        server,
        balances,
        merchants,
    }
}

/// App with one account provisioned.
pub async fn spawn_app_with_account(food: i64, meal: i64, cash: i64) -> TestApp {
    let app = spawn_app();
    app.balances.create("1", food, meal, cash).await.unwrap();
    app
}
