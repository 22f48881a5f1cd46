use axum::{extract::State, Json};
use std::sync::Arc;

use super::AdminUser;
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::services::{Summary, SummaryService};

/// GET /api/summary/ - Admin dashboard figures
pub async fn get_summary(
    _admin: AdminUser,
    State(service): State<Arc<SummaryService>>,
) -> Result<Json<ApiResponse<Summary>>, ApiError> {
    let summary = service.summary().await?;
    Ok(Json(ApiResponse::ok(summary)))
}
