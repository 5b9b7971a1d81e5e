//! Storage ports and adapters.
//!
//! The authorization core talks to storage through two traits so the same
//! pipeline runs against PostgreSQL in production and an in-memory ledger
//! in tests:
//!
//! - `BalanceStore` / `BalanceLease`: exclusive fetch-for-mutation of one
//!   account's balance row plus the atomic triple write
//!   {balance, transaction, audit}
//! - `MerchantStore`: the merchant registry consumed by MCC resolution
//!
//! # Locking Contract
//!
//! `lock_and_fetch` blocks until it holds the exclusive claim on the
//! account's row or the bounded wait elapses (`AppError::LockTimeout`).
//! The returned lease keeps that claim for the whole unit of work:
//! committing applies all three writes or none, dropping the lease
//! releases the claim with no trace.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        balance::AccountBalance,
        history::NewBalanceAudit,
        merchant::{Merchant, NewMerchant},
        transaction::{NewTransaction, Transaction},
    },
};

pub mod memory;
pub mod postgres;

/// Durable, versioned store of per-account balances and the records that
/// mutate them.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Acquire the exclusive claim on the account's balance row and return
    /// it for mutation.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if no balance row exists for the account
    /// - `LockTimeout` if the claim cannot be acquired within the bound
    async fn lock_and_fetch(&self, account: &str) -> Result<Box<dyn BalanceLease>, AppError>;

    /// Read the current balance without taking the write claim.
    async fn fetch(&self, account: &str) -> Result<Option<AccountBalance>, AppError>;

    /// Provision a balance row. Used at bootstrap; accounts are never
    /// created by the authorization path.
    async fn create(
        &self,
        account: &str,
        food_cents: i64,
        meal_cents: i64,
        cash_cents: i64,
    ) -> Result<AccountBalance, AppError>;

    /// Committed transactions for one account, newest first.
    async fn transactions_for_account(&self, account: &str) -> Result<Vec<Transaction>, AppError>;

    /// Connectivity probe for the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Exclusive claim on one account's balance row for the duration of an
/// authorization unit of work.
///
/// Dropping a lease without committing aborts the unit of work.
#[async_trait]
pub trait BalanceLease: Send {
    /// The balance as it was at the exclusive fetch.
    fn balance(&self) -> &AccountBalance;

    /// Apply {balance update, transaction insert, audit insert} as one
    /// all-or-nothing unit and release the claim.
    ///
    /// # Errors
    ///
    /// - `DuplicateIdempotencyKey` if the transaction's key was already
    ///   committed (uniqueness is checked here, inside the atomic unit,
    ///   never by a pre-check)
    /// - `StaleBalance` if the row's version no longer matches the fetch
    async fn commit(
        self: Box<Self>,
        updated: AccountBalance,
        transaction: NewTransaction,
        audit: NewBalanceAudit,
    ) -> Result<(), AppError>;
}

impl std::fmt::Debug for dyn BalanceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BalanceLease")
    }
}

/// Merchant registry, keyed by normalized merchant name.
#[async_trait]
pub trait MerchantStore: Send + Sync {
    /// Exact-match lookup by normalized name.
    async fn find_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> Result<Option<Merchant>, AppError>;

    /// Register a merchant.
    ///
    /// # Errors
    ///
    /// `MerchantAlreadyExists` if the normalized name is taken.
    async fn insert(&self, merchant: NewMerchant) -> Result<Merchant, AppError>;

    /// All registered merchants, newest first.
    async fn all(&self) -> Result<Vec<Merchant>, AppError>;
}
