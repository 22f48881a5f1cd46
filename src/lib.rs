//! Loan ledger backend library
//!
//! Customer onboarding, loan products, the application workflow,
//! disbursement with amortization schedules, and an append-only payment
//! ledger behind a JSON API.

pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod loan_type;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod services;
pub mod state;
