//! In-memory storage adapters.
//!
//! Implements the same locking and atomicity contract as the PostgreSQL
//! adapters over process-local state: a per-account `tokio::sync::Mutex`
//! plays the role of the row lock (acquired through a bounded wait), and
//! a single ledger lock makes the commit's triple write all-or-nothing.
//! Used by the test suite; also handy for running the service without a
//! database.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    error::AppError,
    models::{
        balance::AccountBalance,
        history::{BalanceHistory, NewBalanceAudit},
        merchant::{Merchant, NewMerchant},
        transaction::{NewTransaction, Transaction},
    },
    stores::{BalanceLease, BalanceStore, MerchantStore},
};

/// Default bounded wait for the per-account lock, matching the Postgres
/// adapter's default.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(250);

/// Append-only record of committed transactions and audit entries, plus
/// the id counters. One lock guards all of it so a commit is atomic.
#[derive(Default)]
struct Ledger {
    transactions: Vec<Transaction>,
    histories: Vec<BalanceHistory>,
    next_balance_id: i64,
    next_transaction_id: i64,
    next_history_id: i64,
}

impl Ledger {
    fn new() -> Self {
        Self {
            next_balance_id: 1,
            next_transaction_id: 1,
            next_history_id: 1,
            ..Self::default()
        }
    }
}

/// A thread-safe in-memory balance store.
#[derive(Clone)]
pub struct InMemoryBalanceStore {
    accounts: Arc<RwLock<HashMap<String, Arc<Mutex<AccountBalance>>>>>,
    ledger: Arc<Mutex<Ledger>>,
    lock_timeout: Duration,
}

impl Default for InMemoryBalanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBalanceStore {
    /// Creates an empty store with the default 250 ms lock bound.
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates an empty store with a custom lock bound.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            ledger: Arc::new(Mutex::new(Ledger::new())),
            lock_timeout,
        }
    }

    /// Audit entries for one account, oldest first. Not part of the store
    /// port; exposed for assertions in tests.
    pub async fn histories_for_account(&self, account: &str) -> Vec<BalanceHistory> {
        let ledger = self.ledger.lock().await;
        ledger
            .histories
            .iter()
            .filter(|h| h.account == account)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn lock_and_fetch(&self, account: &str) -> Result<Box<dyn BalanceLease>, AppError> {
        let slot = {
            let accounts = self.accounts.read().await;
            accounts.get(account).cloned()
        }
        .ok_or(AppError::AccountNotFound)?;

        // The per-account mutex is the row lock; waiters queue here until
        // the current unit of work finishes or the bound elapses.
        let guard = tokio::time::timeout(self.lock_timeout, slot.lock_owned())
            .await
            .map_err(|_| AppError::LockTimeout)?;

        let fetched = (*guard).clone();
        Ok(Box::new(MemoryBalanceLease {
            guard,
            fetched,
            ledger: Arc::clone(&self.ledger),
        }))
    }

    async fn fetch(&self, account: &str) -> Result<Option<AccountBalance>, AppError> {
        let slot = {
            let accounts = self.accounts.read().await;
            accounts.get(account).cloned()
        };

        match slot {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        account: &str,
        food_cents: i64,
        meal_cents: i64,
        cash_cents: i64,
    ) -> Result<AccountBalance, AppError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(account) {
            return Err(AppError::InvalidRequest(format!(
                "account {account} is already provisioned"
            )));
        }

        let mut ledger = self.ledger.lock().await;
        let id = ledger.next_balance_id;
        ledger.next_balance_id += 1;

        let now = Utc::now();
        let balance = AccountBalance {
            id,
            account: account.to_string(),
            food_cents,
            meal_cents,
            cash_cents,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(account.to_string(), Arc::new(Mutex::new(balance.clone())));

        Ok(balance)
    }

    async fn transactions_for_account(&self, account: &str) -> Result<Vec<Transaction>, AppError> {
        let ledger = self.ledger.lock().await;
        let mut transactions: Vec<Transaction> = ledger
            .transactions
            .iter()
            .filter(|t| t.account == account)
            .cloned()
            .collect();
        // Ids grow in commit order, so descending id is newest first.
        transactions.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(transactions)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Holds the per-account mutex for the duration of the unit of work.
struct MemoryBalanceLease {
    guard: OwnedMutexGuard<AccountBalance>,
    fetched: AccountBalance,
    ledger: Arc<Mutex<Ledger>>,
}

#[async_trait]
impl BalanceLease for MemoryBalanceLease {
    fn balance(&self) -> &AccountBalance {
        &self.fetched
    }

    async fn commit(
        mut self: Box<Self>,
        updated: AccountBalance,
        transaction: NewTransaction,
        audit: NewBalanceAudit,
    ) -> Result<(), AppError> {
        let ledger = Arc::clone(&self.ledger);
        let mut ledger = ledger.lock().await;

        // Uniqueness and version checks come before any mutation, so a
        // rejected commit leaves no trace.
        if ledger
            .transactions
            .iter()
            .any(|t| t.idempotency_key == transaction.idempotency_key)
        {
            return Err(AppError::DuplicateIdempotencyKey);
        }
        if updated.version != self.guard.version {
            return Err(AppError::StaleBalance);
        }

        let now = Utc::now();

        let transaction_id = ledger.next_transaction_id;
        ledger.next_transaction_id += 1;
        ledger.transactions.push(Transaction {
            id: transaction_id,
            account: transaction.account,
            requested_mcc: transaction.requested_mcc,
            resolved_mcc: transaction.resolved_mcc,
            merchant: transaction.merchant,
            amount_cents: transaction.amount_cents,
            kind: transaction.kind.as_str().to_string(),
            idempotency_key: transaction.idempotency_key,
            created_at: now,
        });

        let history_id = ledger.next_history_id;
        ledger.next_history_id += 1;
        ledger.histories.push(BalanceHistory {
            id: history_id,
            account: audit.account,
            transaction_id,
            previous_food_cents: audit.previous_food_cents,
            previous_meal_cents: audit.previous_meal_cents,
            previous_cash_cents: audit.previous_cash_cents,
            new_food_cents: audit.new_food_cents,
            new_meal_cents: audit.new_meal_cents,
            new_cash_cents: audit.new_cash_cents,
            created_at: now,
        });

        let next_version = self.guard.version + 1;
        *self.guard = AccountBalance {
            version: next_version,
            updated_at: now,
            ..updated
        };

        Ok(())
    }
}

/// A thread-safe in-memory merchant registry.
#[derive(Default, Clone)]
pub struct InMemoryMerchantStore {
    merchants: Arc<RwLock<Vec<Merchant>>>,
}

impl InMemoryMerchantStore {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MerchantStore for InMemoryMerchantStore {
    async fn find_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> Result<Option<Merchant>, AppError> {
        let merchants = self.merchants.read().await;
        Ok(merchants
            .iter()
            .find(|m| m.normalized_name == normalized_name)
            .cloned())
    }

    async fn insert(&self, merchant: NewMerchant) -> Result<Merchant, AppError> {
        let mut merchants = self.merchants.write().await;
        if merchants
            .iter()
            .any(|m| m.normalized_name == merchant.normalized_name)
        {
            return Err(AppError::MerchantAlreadyExists);
        }

        let merchant = Merchant {
            id: merchants.len() as i64 + 1,
            original_name: merchant.original_name,
            normalized_name: merchant.normalized_name,
            corrected_mcc: merchant.corrected_mcc,
            created_at: Utc::now(),
        };
        merchants.push(merchant.clone());

        Ok(merchant)
    }

    async fn all(&self) -> Result<Vec<Merchant>, AppError> {
        let merchants = self.merchants.read().await;
        Ok(merchants.iter().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::TransactionKind;
    use uuid::Uuid;

    fn debit_payload(account: &str, amount_cents: i64, key: Uuid) -> NewTransaction {
        NewTransaction {
            account: account.to_string(),
            requested_mcc: "5411".to_string(),
            resolved_mcc: "5411".to_string(),
            merchant: "MERCADO TESTE".to_string(),
            amount_cents,
            kind: TransactionKind::Debit,
            idempotency_key: key,
        }
    }

    async fn store_with_account(food: i64, meal: i64, cash: i64) -> InMemoryBalanceStore {
        let store = InMemoryBalanceStore::with_lock_timeout(Duration::from_millis(50));
        store.create("1", food, meal, cash).await.unwrap();
        store
    }

    #[tokio::test]
    async fn commit_applies_all_three_writes() {
        let store = store_with_account(10_000, 0, 0).await;

        let lease = store.lock_and_fetch("1").await.unwrap();
        let fetched = lease.balance().clone();
        let updated = fetched.debit(crate::models::balance::BalanceBucket::Food, 2_500);
        let audit = NewBalanceAudit::capture(&fetched, &updated);
        lease
            .commit(updated, debit_payload("1", 2_500, Uuid::new_v4()), audit)
            .await
            .unwrap();

        let balance = store.fetch("1").await.unwrap().unwrap();
        assert_eq!(balance.food_cents, 7_500);
        assert_eq!(balance.version, 1);

        let transactions = store.transactions_for_account("1").await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount_cents, 2_500);

        let histories = store.histories_for_account("1").await;
        assert_eq!(histories.len(), 1);
        assert_eq!(histories[0].previous_food_cents, 10_000);
        assert_eq!(histories[0].new_food_cents, 7_500);
        assert_eq!(histories[0].transaction_id, transactions[0].id);
    }

    #[tokio::test]
    async fn second_fetch_times_out_while_lease_is_held() {
        let store = store_with_account(10_000, 0, 0).await;

        let _held = store.lock_and_fetch("1").await.unwrap();
        let err = store.lock_and_fetch("1").await.unwrap_err();
        assert!(matches!(err, AppError::LockTimeout));
    }

    #[tokio::test]
    async fn lock_is_released_when_lease_is_dropped() {
        let store = store_with_account(10_000, 0, 0).await;

        drop(store.lock_and_fetch("1").await.unwrap());
        assert!(store.lock_and_fetch("1").await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_idempotency_key_rejects_the_whole_commit() {
        let store = store_with_account(10_000, 0, 0).await;
        let key = Uuid::new_v4();

        for expected in [Ok(()), Err(())] {
            let lease = store.lock_and_fetch("1").await.unwrap();
            let fetched = lease.balance().clone();
            let updated = fetched.debit(crate::models::balance::BalanceBucket::Food, 1_000);
            let audit = NewBalanceAudit::capture(&fetched, &updated);
            let result = lease.commit(updated, debit_payload("1", 1_000, key), audit).await;

            match expected {
                Ok(()) => result.unwrap(),
                Err(()) => {
                    assert!(matches!(result.unwrap_err(), AppError::DuplicateIdempotencyKey));
                }
            }
        }

        // Only the first commit left any trace.
        let balance = store.fetch("1").await.unwrap().unwrap();
        assert_eq!(balance.food_cents, 9_000);
        assert_eq!(balance.version, 1);
        assert_eq!(store.transactions_for_account("1").await.unwrap().len(), 1);
        assert_eq!(store.histories_for_account("1").await.len(), 1);
    }

    #[tokio::test]
    async fn commit_with_stale_version_is_rejected() {
        let store = store_with_account(10_000, 0, 0).await;

        let lease = store.lock_and_fetch("1").await.unwrap();
        let fetched = lease.balance().clone();
        let mut updated = fetched.debit(crate::models::balance::BalanceBucket::Food, 1_000);
        updated.version += 1;
        let audit = NewBalanceAudit::capture(&fetched, &updated);
        let err = lease
            .commit(updated, debit_payload("1", 1_000, Uuid::new_v4()), audit)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StaleBalance));
        assert_eq!(store.fetch("1").await.unwrap().unwrap().food_cents, 10_000);
    }

    #[tokio::test]
    async fn unknown_account_is_reported_as_not_found() {
        let store = InMemoryBalanceStore::new();
        let err = store.lock_and_fetch("missing").await.unwrap_err();
        assert!(matches!(err, AppError::AccountNotFound));
    }

    #[tokio::test]
    async fn merchant_registry_rejects_duplicate_normalized_names() {
        let store = InMemoryMerchantStore::new();
        let entry = NewMerchant {
            original_name: "Uber Eats".to_string(),
            normalized_name: "UBER EATS".to_string(),
            corrected_mcc: "5811".to_string(),
        };

        store.insert(entry.clone()).await.unwrap();
        let err = store.insert(entry).await.unwrap_err();
        assert!(matches!(err, AppError::MerchantAlreadyExists));
        assert_eq!(store.all().await.unwrap().len(), 1);
    }
}
