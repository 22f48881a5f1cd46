//! Admin customer routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::customer;
use crate::state::AppState;

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/customers/", get(customer::list_customers))
        .route("/api/customers/list/", get(customer::list_customers))
        .route(
            "/api/admin/customers/:id/approve/",
            put(customer::approve_customer),
        )
        .route(
            "/api/admin/create-customer/",
            post(customer::create_customer),
        )
}
