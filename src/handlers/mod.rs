//! HTTP handlers for the loan ledger API
//!
//! Resource endpoints wrap their payload in [`ApiResponse`](crate::models::ApiResponse);
//! the register and login endpoints return theirs unwrapped.

pub mod application;
pub mod auth;
pub mod customer;
pub mod health;
pub mod loan;
pub mod loan_type;
pub mod payment;
pub mod summary;

pub use crate::middleware::auth::{AdminUser, AuthenticatedUser};
