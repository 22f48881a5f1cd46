//! Cross-cutting services that span more than one domain table

mod customer;
mod summary;

pub use customer::CustomerService;
pub use summary::{Summary, SummaryService};
