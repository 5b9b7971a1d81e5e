//! Startup seed data.
//!
//! Mirrors the bootstrap of the issuing platform: a couple of known
//! merchants with corrected MCCs and one demo account. Both steps are
//! idempotent, so restarting the service leaves existing data alone.
//!
//! Full account provisioning (initial credit transactions plus their
//! balance history) belongs to an onboarding flow outside this service;
//! the demo account is created with its buckets pre-funded.

use crate::{error::AppError, services::merchant, stores::{BalanceStore, MerchantStore}};

const DEMO_ACCOUNT: &str = "1";
const DEMO_BUCKET_CENTS: i64 = 20_000;

/// Populate the merchant registry and the demo account if absent.
pub async fn seed_demo_data(
    balances: &dyn BalanceStore,
    merchants: &dyn MerchantStore,
) -> Result<(), AppError> {
    if merchants.all().await?.is_empty() {
        merchant::register_merchant(
            merchants,
            "UBER TRIP                   SAO PAULO BR",
            "1520",
        )
        .await?;
        merchant::register_merchant(
            merchants,
            "UBER EATS                   SAO PAULO BR",
            "5811",
        )
        .await?;
        tracing::info!("seeded merchant registry");
    }

    if balances.fetch(DEMO_ACCOUNT).await?.is_none() {
        balances
            .create(
                DEMO_ACCOUNT,
                DEMO_BUCKET_CENTS,
                DEMO_BUCKET_CENTS,
                DEMO_BUCKET_CENTS,
            )
            .await?;
        tracing::info!(account = DEMO_ACCOUNT, "seeded demo account");
    }

    Ok(())
}
