//! Balance history (audit) model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::balance::AccountBalance;

/// Represents a balance history record from the database.
///
/// One row per committed debit, linked one-to-one to its transaction,
/// capturing every bucket before and after. Exactly one bucket differs
/// between the previous and new values.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct BalanceHistory {
    pub id: i64,
    pub account: String,
    pub transaction_id: i64,
    pub previous_food_cents: i64,
    pub previous_meal_cents: i64,
    pub previous_cash_cents: i64,
    pub new_food_cents: i64,
    pub new_meal_cents: i64,
    pub new_cash_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for one audit entry. The transaction id is wired in by
/// the store at commit time, once the transaction row exists.
#[derive(Debug, Clone)]
pub struct NewBalanceAudit {
    pub account: String,
    pub previous_food_cents: i64,
    pub previous_meal_cents: i64,
    pub previous_cash_cents: i64,
    pub new_food_cents: i64,
    pub new_meal_cents: i64,
    pub new_cash_cents: i64,
}

impl NewBalanceAudit {
    /// Snapshot all three buckets of the pre-debit and post-debit balance.
    pub fn capture(previous: &AccountBalance, updated: &AccountBalance) -> Self {
        Self {
            account: previous.account.clone(),
            previous_food_cents: previous.food_cents,
            previous_meal_cents: previous.meal_cents,
            previous_cash_cents: previous.cash_cents,
            new_food_cents: updated.food_cents,
            new_meal_cents: updated.meal_cents,
            new_cash_cents: updated.cash_cents,
        }
    }
}
