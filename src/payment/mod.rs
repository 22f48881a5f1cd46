//! Payment processor
//!
//! Append-only repayment ledger. Each payment lowers the loan balance and
//! settles installments oldest first inside one transaction.

mod model;
mod service;

pub use model::*;
pub use service::PaymentService;
