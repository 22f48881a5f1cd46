use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::db::Database;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: &'static str,
    schema_version: Option<i64>,
    version: &'static str,
}

/// GET /health
pub async fn health_check(State(db): State<Database>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database, schema_version) = match db.health().await {
        Ok(health) => (StatusCode::OK, "healthy", "connected", health.schema_version),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "unreachable", None)
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            schema_version,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
