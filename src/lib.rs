//! Card Authorization Service
//!
//! Authorizes point-of-sale debit transactions against a multi-wallet
//! account balance (food, meal, general-purpose cash), with exactly-once
//! processing per idempotency token and race-free balance mutation under
//! concurrent attempts on the same account.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries); storage sits
//!   behind ports so tests run over in-memory adapters
//! - **Concurrency**: exclusive, bounded-wait row lock per account plus a
//!   version counter; the {balance, transaction, audit} commit is one
//!   atomic unit
//! - **Format**: JSON requests/responses

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod stores;
