//! Merchant name normalization, MCC resolution and registration.
//!
//! Terminals submit merchant names with inconsistent casing, punctuation
//! and padding. The registry stores one normalized form per merchant, and
//! resolution looks up an MCC override by that form; an unknown merchant
//! falls back to the code the terminal submitted.

use crate::{
    error::AppError,
    models::merchant::{Merchant, NewMerchant},
    stores::MerchantStore,
};

/// Normalize a merchant name for registry lookups.
///
/// Uppercases, strips everything outside ASCII letters, digits and
/// whitespace, collapses whitespace runs to a single space and trims the
/// ends. Normalizing an already-normalized name is a no-op, and an empty
/// or punctuation-only name normalizes to the empty string, which matches
/// no registry entry.
pub fn normalize_merchant_name(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve the effective MCC for a request.
///
/// A registered merchant override takes precedence over the submitted
/// code; otherwise the submitted code is returned as-is.
pub async fn resolve_mcc(
    merchants: &dyn MerchantStore,
    submitted_mcc: &str,
    merchant_name: &str,
) -> Result<String, AppError> {
    let normalized = normalize_merchant_name(merchant_name);

    let correction = merchants
        .find_by_normalized_name(&normalized)
        .await?
        .map(|m| m.corrected_mcc);

    Ok(correction.unwrap_or_else(|| submitted_mcc.to_string()))
}

/// Register a merchant with a corrected MCC.
///
/// # Errors
///
/// - `InvalidRequest` for blank name or MCC
/// - `MerchantAlreadyExists` if the normalized name is already registered
pub async fn register_merchant(
    merchants: &dyn MerchantStore,
    name: &str,
    corrected_mcc: &str,
) -> Result<Merchant, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "merchant name must not be blank".to_string(),
        ));
    }
    if corrected_mcc.trim().is_empty() {
        return Err(AppError::InvalidRequest("mcc must not be blank".to_string()));
    }

    merchants
        .insert(NewMerchant {
            original_name: name.to_string(),
            normalized_name: normalize_merchant_name(name),
            corrected_mcc: corrected_mcc.to_string(),
        })
        .await
}
