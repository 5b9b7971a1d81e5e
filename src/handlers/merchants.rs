//! Merchant registry HTTP handlers.
//!
//! - POST /api/v1/merchants - Register a merchant with a corrected MCC
//! - GET /api/v1/merchants - List registered merchants

use axum::{Json, extract::State};

use crate::{
    error::AppError,
    models::merchant::{CreateMerchantRequest, MerchantResponse},
    services::merchant,
    state::AppState,
};

/// Register a merchant.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "UBER EATS                   SAO PAULO BR",
///   "mcc": "5811"
/// }
/// ```
///
/// # Response
///
/// - **Success (200)**: the created merchant, including its normalized name
/// - **Error (400)**: blank name or MCC
/// - **Error (409)**: a merchant with the same normalized name exists
pub async fn create_merchant(
    State(state): State<AppState>,
    Json(request): Json<CreateMerchantRequest>,
) -> Result<Json<MerchantResponse>, AppError> {
    let merchant =
        merchant::register_merchant(state.merchants.as_ref(), &request.name, &request.mcc).await?;

    Ok(Json(merchant.into()))
}

/// List all registered merchants, newest first.
pub async fn list_merchants(
    State(state): State<AppState>,
) -> Result<Json<Vec<MerchantResponse>>, AppError> {
    let merchants = state.merchants.all().await?;

    Ok(Json(merchants.into_iter().map(Into::into).collect()))
}
