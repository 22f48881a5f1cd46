//! Account routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register/", post(auth::register))
        .route("/api/users/register/", post(auth::register))
        .route("/api/login/", post(auth::login))
        .route(
            "/api/profile/",
            get(auth::get_profile).put(auth::update_profile),
        )
}
