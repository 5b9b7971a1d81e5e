//! PostgreSQL storage adapters.
//!
//! The balance adapter implements the locking contract with row-level
//! locks: `lock_and_fetch` opens a database transaction, bounds the lock
//! wait with `SET LOCAL lock_timeout`, and takes the row with
//! `SELECT ... FOR UPDATE`. The returned lease owns that open database
//! transaction, so a second authorization on the same account blocks at
//! the `FOR UPDATE` until the first commits or rolls back.
//!
//! # Atomicity
//!
//! All three commit writes execute on the lease's transaction and become
//! visible together at `COMMIT`. sqlx rolls the transaction back when the
//! lease is dropped uncommitted.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Postgres, Transaction as PgTransaction};

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        balance::AccountBalance,
        history::NewBalanceAudit,
        merchant::{Merchant, NewMerchant},
        transaction::{NewTransaction, Transaction},
    },
    stores::{BalanceLease, BalanceStore, MerchantStore},
};

/// SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE raised when `lock_timeout` expires waiting on a row lock.
const LOCK_NOT_AVAILABLE: &str = "55P03";

fn has_sqlstate(err: &sqlx::Error, state: &str) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == state)
}

/// Balance store backed by the `balances`, `transactions` and
/// `balance_history` tables.
#[derive(Clone)]
pub struct PgBalanceStore {
    pool: DbPool,
    lock_timeout: Duration,
}

impl PgBalanceStore {
    pub fn new(pool: DbPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }
}

#[async_trait]
impl BalanceStore for PgBalanceStore {
    async fn lock_and_fetch(&self, account: &str) -> Result<Box<dyn BalanceLease>, AppError> {
        let mut tx = self.pool.begin().await?;

        // SET LOCAL scopes the bound to this transaction only.
        // lock_timeout does not take bind parameters.
        let bound = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout.as_millis());
        sqlx::query(&bound).execute(&mut *tx).await?;

        // FOR UPDATE blocks concurrent fetches of the same row until this
        // transaction ends; past the bound Postgres raises 55P03.
        let balance = sqlx::query_as::<_, AccountBalance>(
            "SELECT * FROM balances WHERE account = $1 FOR UPDATE",
        )
        .bind(account)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if has_sqlstate(&e, LOCK_NOT_AVAILABLE) {
                AppError::LockTimeout
            } else {
                AppError::Database(e)
            }
        })?
        .ok_or(AppError::AccountNotFound)?;

        Ok(Box::new(PgBalanceLease { tx, balance }))
    }

    async fn fetch(&self, account: &str) -> Result<Option<AccountBalance>, AppError> {
        let balance = sqlx::query_as::<_, AccountBalance>("SELECT * FROM balances WHERE account = $1")
            .bind(account)
            .fetch_optional(&self.pool)
            .await?;

        Ok(balance)
    }

    async fn create(
        &self,
        account: &str,
        food_cents: i64,
        meal_cents: i64,
        cash_cents: i64,
    ) -> Result<AccountBalance, AppError> {
        let balance = sqlx::query_as::<_, AccountBalance>(
            r#"
            INSERT INTO balances (account, food_cents, meal_cents, cash_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(account)
        .bind(food_cents)
        .bind(meal_cents)
        .bind(cash_cents)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    async fn transactions_for_account(&self, account: &str) -> Result<Vec<Transaction>, AppError> {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE account = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(account)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Open database transaction holding the `FOR UPDATE` claim on one
/// balance row.
struct PgBalanceLease {
    tx: PgTransaction<'static, Postgres>,
    balance: AccountBalance,
}

#[async_trait]
impl BalanceLease for PgBalanceLease {
    fn balance(&self) -> &AccountBalance {
        &self.balance
    }

    async fn commit(
        mut self: Box<Self>,
        updated: AccountBalance,
        transaction: NewTransaction,
        audit: NewBalanceAudit,
    ) -> Result<(), AppError> {
        // Version-guarded update: the row was locked at fetch, so zero
        // affected rows means the lease was misused, not a lost race.
        let updated_count = sqlx::query(
            r#"
            UPDATE balances
            SET food_cents = $1,
                meal_cents = $2,
                cash_cents = $3,
                version = version + 1,
                updated_at = NOW()
            WHERE account = $4 AND version = $5
            "#,
        )
        .bind(updated.food_cents)
        .bind(updated.meal_cents)
        .bind(updated.cash_cents)
        .bind(&updated.account)
        .bind(self.balance.version)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        if updated_count == 0 {
            return Err(AppError::StaleBalance);
        }

        // The UNIQUE constraint on idempotency_key fires here, inside the
        // same database transaction as the balance update, so a duplicate
        // submission rolls everything back.
        let transaction_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (
                account,
                requested_mcc,
                resolved_mcc,
                merchant,
                amount_cents,
                kind,
                idempotency_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&transaction.account)
        .bind(&transaction.requested_mcc)
        .bind(&transaction.resolved_mcc)
        .bind(&transaction.merchant)
        .bind(transaction.amount_cents)
        .bind(transaction.kind.as_str())
        .bind(transaction.idempotency_key)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if has_sqlstate(&e, UNIQUE_VIOLATION) {
                AppError::DuplicateIdempotencyKey
            } else {
                AppError::Database(e)
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO balance_history (
                account,
                transaction_id,
                previous_food_cents,
                previous_meal_cents,
                previous_cash_cents,
                new_food_cents,
                new_meal_cents,
                new_cash_cents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&audit.account)
        .bind(transaction_id)
        .bind(audit.previous_food_cents)
        .bind(audit.previous_meal_cents)
        .bind(audit.previous_cash_cents)
        .bind(audit.new_food_cents)
        .bind(audit.new_meal_cents)
        .bind(audit.new_cash_cents)
        .execute(&mut *self.tx)
        .await?;

        self.tx.commit().await?;

        Ok(())
    }
}

/// Merchant registry backed by the `merchants` table.
#[derive(Clone)]
pub struct PgMerchantStore {
    pool: DbPool,
}

impl PgMerchantStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MerchantStore for PgMerchantStore {
    async fn find_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> Result<Option<Merchant>, AppError> {
        let merchant =
            sqlx::query_as::<_, Merchant>("SELECT * FROM merchants WHERE normalized_name = $1")
                .bind(normalized_name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(merchant)
    }

    async fn insert(&self, merchant: NewMerchant) -> Result<Merchant, AppError> {
        let merchant = sqlx::query_as::<_, Merchant>(
            r#"
            INSERT INTO merchants (original_name, normalized_name, corrected_mcc)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&merchant.original_name)
        .bind(&merchant.normalized_name)
        .bind(&merchant.corrected_mcc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if has_sqlstate(&e, UNIQUE_VIOLATION) {
                AppError::MerchantAlreadyExists
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(merchant)
    }

    async fn all(&self) -> Result<Vec<Merchant>, AppError> {
        let merchants =
            sqlx::query_as::<_, Merchant>("SELECT * FROM merchants ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(merchants)
    }
}
