//! Account read HTTP handlers.
//!
//! This module implements the account-facing read endpoints:
//! - GET /api/v1/accounts/:account/balance - Current sub-balances
//! - GET /api/v1/accounts/:account/transactions - Committed transactions
//!
//! The transaction listing doubles as the recovery path for duplicate
//! submissions: a caller whose replayed idempotency key was rejected
//! finds the originally committed transaction here.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    error::AppError,
    models::{balance::BalanceResponse, transaction::TransactionResponse},
    state::AppState,
};

/// Get the current balance of one account.
///
/// # Response
///
/// - **Success (200)**: the three sub-balances
/// - **Error (404)**: no balance row for this account
pub async fn get_balance(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = state
        .balances
        .fetch(&account)
        .await?
        .ok_or(AppError::AccountNotFound)?;

    Ok(Json(balance.into()))
}

/// List the committed transactions of one account, newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let transactions = state.balances.transactions_for_account(&account).await?;

    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}
