//! Admin customer management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::AdminUser;
use crate::auth::AuthService;
use crate::error::ApiError;
use crate::models::{
    ApiResponse, CustomerDetail, PaginatedResponse, Pagination, RegisterRequest,
    RegistrationResponse,
};
use crate::services::CustomerService;

/// GET /api/admin/customers/
pub async fn list_customers(
    AdminUser(_admin): AdminUser,
    State(customers): State<Arc<CustomerService>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PaginatedResponse<CustomerDetail>>>, ApiError> {
    let page = customers.list_customers(pagination).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// PUT /api/admin/customers/:id/approve/
pub async fn approve_customer(
    AdminUser(admin): AdminUser,
    State(customers): State<Arc<CustomerService>>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<CustomerDetail>>, ApiError> {
    let detail = customers.approve_customer(user_id, admin.user_id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// POST /api/admin/create-customer/ - Account is created already approved
pub async fn create_customer(
    AdminUser(admin): AdminUser,
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegistrationResponse>>), ApiError> {
    request.validate()?;

    let (user, profile) = auth.register_customer(request, Some(admin.user_id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(RegistrationResponse {
            message: "Customer created and approved.".to_string(),
            user: user.into(),
            profile,
        })),
    ))
}
