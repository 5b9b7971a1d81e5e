//! Merchant registry model and API request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a merchant registry record from the database.
///
/// Maps a normalized merchant name to the MCC that should be used instead
/// of whatever the terminal submits. Consumed read-only by the resolver.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Merchant {
    /// Unique identifier for this merchant
    pub id: i64,

    /// Name exactly as registered
    pub original_name: String,

    /// Normalized form used for lookups, unique across the registry
    pub normalized_name: String,

    /// MCC that overrides the terminal-submitted code
    pub corrected_mcc: String,

    /// When the merchant was registered
    pub created_at: DateTime<Utc>,
}

/// Insert payload for one merchant registry entry.
#[derive(Debug, Clone)]
pub struct NewMerchant {
    pub original_name: String,
    pub normalized_name: String,
    pub corrected_mcc: String,
}

/// Request body for registering a merchant.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "UBER EATS                   SAO PAULO BR",
///   "mcc": "5811"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateMerchantRequest {
    /// Merchant name as it appears on terminal messages
    pub name: String,

    /// Corrected MCC to apply when this merchant is seen
    pub mcc: String,
}

/// Response body for merchant endpoints.
#[derive(Debug, Serialize)]
pub struct MerchantResponse {
    pub id: i64,
    pub original_name: String,
    pub normalized_name: String,
    pub corrected_mcc: String,
    pub created_at: DateTime<Utc>,
}

impl From<Merchant> for MerchantResponse {
    fn from(merchant: Merchant) -> Self {
        Self {
            id: merchant.id,
            original_name: merchant.original_name,
            normalized_name: merchant.normalized_name,
            corrected_mcc: merchant.corrected_mcc,
            created_at: merchant.created_at,
        }
    }
}
