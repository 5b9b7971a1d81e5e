//! Business logic services.
//!
//! Services contain the authorization pipeline separated from HTTP
//! handlers: the orchestrator, the pure debit engine, and merchant
//! resolution/registration.

pub mod authorizer;
pub mod debit;
pub mod merchant;
