//! Loan product routes, served under both the compact and hyphenated prefixes

use axum::{routing::get, Router};

use crate::handlers::loan_type::*;
use crate::state::AppState;

pub fn loan_type_routes() -> Router<AppState> {
    ["/api/loantypes", "/api/loan-types"]
        .into_iter()
        .fold(Router::new(), |router, prefix| {
            router
                .route(
                    &format!("{}/", prefix),
                    get(list_loan_types).post(create_loan_type),
                )
                .route(
                    &format!("{}/:id/", prefix),
                    get(get_loan_type)
                        .put(update_loan_type)
                        .delete(delete_loan_type),
                )
        })
}
