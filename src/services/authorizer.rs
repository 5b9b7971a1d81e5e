//! Authorization orchestrator - the core decision pipeline.
//!
//! For each request: validate, resolve the effective MCC, route it to a
//! bucket, take the exclusive claim on the account's balance row, run the
//! debit engine with the cash-fallback policy, and commit
//! {balance, transaction, audit} as one atomic unit keyed by the caller's
//! idempotency token.
//!
//! # Side Effects
//!
//! Only the commit writes anything. Validation, resolution and both debit
//! attempts are pure or read-only, so every declined request leaves no
//! trace.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        balance::{AccountBalance, BalanceBucket},
        transaction::{NewTransaction, TransactionKind},
    },
    services::debit::{self, DebitOutcome},
    services::merchant,
    stores::{BalanceStore, MerchantStore},
};

/// Authorization request as submitted by the terminal-facing transport.
///
/// # JSON Example
///
/// ```json
/// {
///   "account": "1",
///   "amount_cents": 10000,
///   "mcc": "5412",
///   "merchant": "PADARIA DO ZE               SAO PAULO BR"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationRequest {
    pub account: String,
    pub amount_cents: i64,
    pub mcc: String,
    pub merchant: String,
}

impl AuthorizationRequest {
    /// Synchronous precondition checks; no I/O happens before these pass.
    fn validate(&self) -> Result<(), AppError> {
        if self.account.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "account must not be blank".to_string(),
            ));
        }
        if self.mcc.trim().is_empty() {
            return Err(AppError::InvalidRequest("mcc must not be blank".to_string()));
        }
        if self.merchant.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "merchant must not be blank".to_string(),
            ));
        }
        if self.amount_cents <= 0 {
            return Err(AppError::InvalidRequest(
                "amount_cents must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// The three business outcomes an authorization can reach.
///
/// Carried to the terminal as ISO-8583-style response codes; everything
/// that is not an approval or a plain insufficiency collapses to
/// `UnexpectedError` at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Approved,
    InsufficientBalance,
    UnexpectedError,
}

impl AuthorizationOutcome {
    /// Response code sent to the terminal.
    pub fn code(&self) -> &'static str {
        match self {
            AuthorizationOutcome::Approved => "00",
            AuthorizationOutcome::InsufficientBalance => "51",
            AuthorizationOutcome::UnexpectedError => "07",
        }
    }
}

/// Response body of the authorization endpoint.
#[derive(Debug, Serialize)]
pub struct AuthorizationResponse {
    pub code: String,
}

impl From<AuthorizationOutcome> for AuthorizationResponse {
    fn from(outcome: AuthorizationOutcome) -> Self {
        Self {
            code: outcome.code().to_string(),
        }
    }
}

/// Authorize one point-of-sale debit.
///
/// # Process
///
/// 1. Validate the request (blank fields, non-positive amount)
/// 2. Resolve the effective MCC (merchant override wins)
/// 3. Route the MCC to the primary bucket
/// 4. Take the exclusive claim on the account's balance row
/// 5. Try the primary bucket, then fall back to cash once
/// 6. Insufficiency on both: return `InsufficientBalance`, persist nothing
/// 7. Otherwise commit balance + transaction + audit atomically
///
/// # Errors
///
/// Every non-business failure propagates with its concrete kind
/// (`InvalidRequest`, `AccountNotFound`, `LockTimeout`,
/// `DuplicateIdempotencyKey`, `Database`); the HTTP handler collapses
/// them to the generic `"07"` code.
pub async fn authorize(
    balances: &dyn BalanceStore,
    merchants: &dyn MerchantStore,
    idempotency_key: Uuid,
    request: &AuthorizationRequest,
) -> Result<AuthorizationOutcome, AppError> {
    request.validate()?;

    let resolved_mcc = merchant::resolve_mcc(merchants, &request.mcc, &request.merchant).await?;
    let primary_bucket = BalanceBucket::for_mcc(&resolved_mcc);

    let lease = balances.lock_and_fetch(&request.account).await?;
    let current = lease.balance().clone();

    let Some(DebitOutcome { new_balance, audit }) =
        attempt_debit_with_fallback(&current, primary_bucket, request.amount_cents)
    else {
        tracing::info!(
            account = %request.account,
            amount_cents = request.amount_cents,
            resolved_mcc = %resolved_mcc,
            "authorization declined: insufficient balance"
        );
        return Ok(AuthorizationOutcome::InsufficientBalance);
    };

    let transaction = NewTransaction {
        account: request.account.clone(),
        requested_mcc: request.mcc.clone(),
        resolved_mcc: resolved_mcc.clone(),
        merchant: request.merchant.clone(),
        amount_cents: request.amount_cents,
        kind: TransactionKind::Debit,
        idempotency_key,
    };

    lease.commit(new_balance, transaction, audit).await?;

    tracing::info!(
        account = %request.account,
        amount_cents = request.amount_cents,
        resolved_mcc = %resolved_mcc,
        "authorization approved"
    );
    Ok(AuthorizationOutcome::Approved)
}

/// Try the primary bucket; on insufficiency retry exactly once against
/// cash, over the same unmutated snapshot. No fallback out of cash.
fn attempt_debit_with_fallback(
    current: &AccountBalance,
    primary_bucket: BalanceBucket,
    amount_cents: i64,
) -> Option<DebitOutcome> {
    let result = debit::try_debit(current, primary_bucket, amount_cents);

    if result.is_none() && primary_bucket != BalanceBucket::Cash {
        return debit::try_debit(current, BalanceBucket::Cash, amount_cents);
    }

    result
}
