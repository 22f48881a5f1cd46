//! Loan application workflow
//!
//! Customers apply for a loan product; admins approve or decline. Approved
//! applications are consumed by disbursement in the `loan` module.

mod model;
mod service;

pub use model::*;
pub(crate) use service::lock_application;
pub use service::ApplicationService;
