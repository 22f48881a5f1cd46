//! Route definitions for the loan ledger API

mod application;
mod auth;
mod customer;
mod loan;
mod loan_type;
mod payment;

use axum::{routing::get, Router};

pub use application::application_routes;
pub use auth::auth_routes;
pub use customer::customer_routes;
pub use loan::loan_routes;
pub use loan_type::loan_type_routes;
pub use payment::payment_routes;

use crate::handlers::health::health_check;
use crate::state::AppState;

/// Every API route bound to the shared state, without the outer middleware stack
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes())
        .merge(customer_routes())
        .merge(loan_type_routes())
        .merge(application_routes())
        .merge(loan_routes())
        .merge(payment_routes())
        .with_state(state)
}
