//! Payment and reporting routes

use axum::{routing::get, Router};

use crate::handlers::{payment, summary};
use crate::state::AppState;

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/payments/",
            get(payment::list_payments).post(payment::record_payment),
        )
        .route("/api/payments/:id/", get(payment::get_payment))
        .route("/api/summary/", get(summary::get_summary))
}
