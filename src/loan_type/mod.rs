//! Loan type domain module
//!
//! Loan products offered to customers: interest rate, rate type and term.

mod model;
mod service;

pub use model::*;
pub use service::LoanTypeService;
