//! Loan application routes

use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::application::*;
use crate::state::AppState;

pub fn application_routes() -> Router<AppState> {
    ["/api/loanapplications", "/api/loan-applications"]
        .into_iter()
        .fold(Router::new(), |router, prefix| {
            router
                .route(
                    &format!("{}/", prefix),
                    get(list_applications).post(create_application),
                )
                .route(
                    &format!("{}/:id/", prefix),
                    get(get_application)
                        .put(update_application)
                        .patch(update_application),
                )
        })
        .route(
            "/api/admin/loanapplications/:id/approve/",
            put(approve_application),
        )
        .route(
            "/api/admin/loanapplications/:id/decline/",
            put(decline_application),
        )
        .route(
            "/api/admin/loanapplications/:id/disburse/",
            put(disburse_application),
        )
}
