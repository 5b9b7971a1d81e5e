//! Transaction data model and API response type.
//!
//! This module defines:
//! - `Transaction`: Database entity for a committed authorization
//! - `NewTransaction`: Insert payload built by the orchestrator
//! - `TransactionResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Whether a transaction added or removed funds.
///
/// Authorizations only ever produce debits; credits exist for account
/// provisioning flows outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Value stored in the `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }
}

/// Represents a transaction record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Each transaction:
/// - Records both the MCC the terminal submitted and the one that was
///   actually used after merchant resolution
/// - Stores the amount in cents (never floats!)
/// - Carries the caller's idempotency key, unique across all rows
///
/// Rows are immutable: they are inserted once, atomically with the balance
/// update and audit entry, and never updated or deleted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Transaction {
    /// Unique identifier for this transaction
    pub id: i64,

    /// Account the debit was authorized against
    pub account: String,

    /// MCC as submitted by the point-of-sale terminal
    pub requested_mcc: String,

    /// MCC after applying any registered merchant override
    pub resolved_mcc: String,

    /// Merchant name as submitted (not normalized)
    pub merchant: String,

    /// Amount in cents (always positive)
    pub amount_cents: i64,

    /// "credit" or "debit"
    pub kind: String,

    /// Caller-supplied key guaranteeing at-most-once processing
    ///
    /// A second commit bearing the same key fails on the UNIQUE
    /// constraint; the whole unit of work rolls back.
    pub idempotency_key: Uuid,

    /// When the transaction was committed
    pub created_at: DateTime<Utc>,
}

/// Insert payload for one transaction, built by the orchestrator and
/// handed to the balance store's commit.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account: String,
    pub requested_mcc: String,
    pub resolved_mcc: String,
    pub merchant: String,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub idempotency_key: Uuid,
}

/// Response body for transaction listings.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": 7,
///   "account": "1",
///   "requested_mcc": "5412",
///   "resolved_mcc": "5412",
///   "merchant": "PADARIA DO ZE               SAO PAULO BR",
///   "amount_cents": 10000,
///   "kind": "debit",
///   "created_at": "2025-12-21T16:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub account: String,
    pub requested_mcc: String,
    pub resolved_mcc: String,
    pub merchant: String,
    pub amount_cents: i64,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// Convert database Transaction to API TransactionResponse.
///
/// This removes the idempotency key, which is the caller's own handle for
/// retries and not part of the read surface.
impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            account: transaction.account,
            requested_mcc: transaction.requested_mcc,
            resolved_mcc: transaction.resolved_mcc,
            merchant: transaction.merchant,
            amount_cents: transaction.amount_cents,
            kind: transaction.kind,
            created_at: transaction.created_at,
        }
    }
}
