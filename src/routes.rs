//! HTTP router construction.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

/// Build the application router.
///
/// Separate from `main` so the test suite can drive the exact same
/// routes over in-memory stores.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Public health probe
        .route("/health", get(handlers::health::health_check))
        // The authorization operation
        .route(
            "/api/v1/authorizations",
            post(handlers::authorizations::authorize),
        )
        // Merchant registry
        .route("/api/v1/merchants", post(handlers::merchants::create_merchant))
        .route("/api/v1/merchants", get(handlers::merchants::list_merchants))
        // Account reads
        .route(
            "/api/v1/accounts/{account}/balance",
            get(handlers::accounts::get_balance),
        )
        .route(
            "/api/v1/accounts/{account}/transactions",
            get(handlers::accounts::list_transactions),
        )
        // Distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
