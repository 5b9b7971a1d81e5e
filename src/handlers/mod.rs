//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, headers)
//! 2. Delegates to the services and stores
//! 3. Returns HTTP response (JSON, status code)

/// Account balance and transaction reads
pub mod accounts;
/// The authorization endpoint
pub mod authorizations;
/// Health check endpoint
pub mod health;
/// Merchant registry endpoints
pub mod merchants;
