//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Account balance and bucket selection
pub mod balance;
/// Balance history (audit) entries
pub mod history;
/// Merchant registry entries
pub mod merchant;
/// Committed transactions
pub mod transaction;
