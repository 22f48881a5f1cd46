//! Loan routes

use axum::{routing::get, Router};

use crate::handlers::loan::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans/", get(list_loans))
        .route("/api/loans/search/", get(search_loans))
        .route("/api/loans/:id/", get(get_loan))
        .route("/api/loans/:id/schedule/", get(get_loan_schedule))
        .route("/api/payment-schedules/", get(list_payment_schedules))
}
