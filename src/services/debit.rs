//! Debit engine - pure computation over a balance snapshot.
//!
//! Given the balance fetched under the exclusive claim, a target bucket
//! and an amount, this produces the post-debit balance and the audit
//! entry, or reports insufficiency. It never touches persisted state;
//! the orchestrator commits the result explicitly.

use crate::models::{
    balance::{AccountBalance, BalanceBucket},
    history::NewBalanceAudit,
};

/// Everything a successful debit attempt computed: the new snapshot and
/// the before/after audit record the commit will persist with it.
#[derive(Debug, Clone)]
pub struct DebitOutcome {
    pub new_balance: AccountBalance,
    pub audit: NewBalanceAudit,
}

/// Attempt to debit `amount_cents` from one bucket of the snapshot.
///
/// Returns `None` when the bucket cannot cover the amount. Sufficiency is
/// checked before subtracting, so the subtraction can never drive a
/// bucket negative.
pub fn try_debit(
    current: &AccountBalance,
    bucket: BalanceBucket,
    amount_cents: i64,
) -> Option<DebitOutcome> {
    if !current.has_sufficient_balance(bucket, amount_cents) {
        return None;
    }

    let new_balance = current.debit(bucket, amount_cents);
    let audit = NewBalanceAudit::capture(current, &new_balance);

    Some(DebitOutcome { new_balance, audit })
}
