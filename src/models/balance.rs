//! Account balance model and bucket selection.
//!
//! This module defines:
//! - `AccountBalance`: Database entity holding the three sub-balances
//! - `BalanceBucket`: Which sub-balance a debit draws from
//! - `BalanceResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The three earmarked sub-balances an account holds.
///
/// A debit always targets exactly one bucket. Category codes submitted by
/// the terminal select the bucket via [`BalanceBucket::for_mcc`]; `Cash` is
/// the general-purpose bucket and the fallback when an earmarked bucket
/// lacks funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceBucket {
    Food,
    Meal,
    Cash,
}

impl BalanceBucket {
    /// Map a merchant category code to the bucket it debits.
    ///
    /// Total function: any code outside the fixed table, including an
    /// empty one, routes to the general-purpose cash bucket.
    pub fn for_mcc(mcc: &str) -> Self {
        match mcc {
            "5411" | "5412" => BalanceBucket::Food,
            "5811" | "5812" => BalanceBucket::Meal,
            _ => BalanceBucket::Cash,
        }
    }
}

/// Represents an account balance record from the database.
///
/// # Database Table
///
/// Maps to the `balances` table. Each account has exactly one row:
/// - Three sub-balances stored as `i64` cents (never floats)
/// - A version counter incremented on every committed mutation
///
/// # Concurrency
///
/// Rows are always fetched for mutation through an exclusive row lock
/// (see the balance store), so the version counter is a secondary guard:
/// a commit carrying a stale version is rejected, never silently applied.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
pub struct AccountBalance {
    /// Unique identifier for this balance row
    pub id: i64,

    /// Account identifier, unique across all balance rows
    pub account: String,

    /// Food bucket, in cents (>= 0, enforced by CHECK constraint)
    pub food_cents: i64,

    /// Meal bucket, in cents (>= 0)
    pub meal_cents: i64,

    /// General-purpose cash bucket, in cents (>= 0)
    pub cash_cents: i64,

    /// Optimistic-concurrency counter, incremented on every commit
    pub version: i32,

    /// When the row was created
    pub created_at: DateTime<Utc>,

    /// When the row was last mutated
    pub updated_at: DateTime<Utc>,
}

impl AccountBalance {
    /// Current value of the given bucket, in cents.
    pub fn amount_in(&self, bucket: BalanceBucket) -> i64 {
        match bucket {
            BalanceBucket::Food => self.food_cents,
            BalanceBucket::Meal => self.meal_cents,
            BalanceBucket::Cash => self.cash_cents,
        }
    }

    /// True if the bucket can cover `amount_cents`.
    pub fn has_sufficient_balance(&self, bucket: BalanceBucket, amount_cents: i64) -> bool {
        self.amount_in(bucket) >= amount_cents
    }

    /// Produce a copy of this balance with `amount_cents` removed from one
    /// bucket. The other buckets and the version are untouched; the commit
    /// step is what bumps the version.
    ///
    /// # Panics
    ///
    /// Panics if the debit would drive the bucket negative. Callers must
    /// check [`Self::has_sufficient_balance`] first; reaching the panic is
    /// a programming error, not a business outcome.
    pub fn debit(&self, bucket: BalanceBucket, amount_cents: i64) -> AccountBalance {
        let mut debited = self.clone();
        debited.set_amount(bucket, self.amount_in(bucket) - amount_cents);
        debited
    }

    fn set_amount(&mut self, bucket: BalanceBucket, amount_cents: i64) {
        assert!(
            amount_cents >= 0,
            "bucket {bucket:?} of account {} would go negative",
            self.account
        );
        match bucket {
            BalanceBucket::Food => self.food_cents = amount_cents,
            BalanceBucket::Meal => self.meal_cents = amount_cents,
            BalanceBucket::Cash => self.cash_cents = amount_cents,
        }
    }
}

/// Response body for the account balance endpoint.
///
/// # JSON Example
///
/// ```json
/// {
///   "account": "1",
///   "food_cents": 20000,
///   "meal_cents": 20000,
///   "cash_cents": 20000,
///   "created_at": "2025-12-20T10:00:00Z",
///   "updated_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub account: String,
    pub food_cents: i64,
    pub meal_cents: i64,
    pub cash_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Convert the database entity to the API response.
///
/// Removes internal fields (row id, version counter) clients don't need.
impl From<AccountBalance> for BalanceResponse {
    fn from(balance: AccountBalance) -> Self {
        Self {
            account: balance.account,
            food_cents: balance.food_cents,
            meal_cents: balance.meal_cents,
            cash_cents: balance.cash_cents,
            created_at: balance.created_at,
            updated_at: balance.updated_at,
        }
    }
}
