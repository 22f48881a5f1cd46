//! Loan application handlers, including the admin decisions

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{AdminUser, AuthenticatedUser};
use crate::application::{
    ApplicationService, CreateApplicationRequest, ListApplicationsQuery, LoanApplication,
    UpdateApplicationRequest,
};
use crate::error::ApiError;
use crate::loan::{LoanDetail, LoanService};
use crate::models::{ApiResponse, PaginatedResponse};

pub async fn list_applications(
    user: AuthenticatedUser,
    State(service): State<Arc<ApplicationService>>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<LoanApplication>>>, ApiError> {
    let page = service.list(&user, query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn create_application(
    user: AuthenticatedUser,
    State(service): State<Arc<ApplicationService>>,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoanApplication>>), ApiError> {
    let application = service.submit(&user, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(application))))
}

pub async fn get_application(
    user: AuthenticatedUser,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LoanApplication>>, ApiError> {
    let application = service.get(id, &user).await?;
    Ok(Json(ApiResponse::ok(application)))
}

/// PUT and PATCH share partial-update semantics
pub async fn update_application(
    user: AuthenticatedUser,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateApplicationRequest>,
) -> Result<Json<ApiResponse<LoanApplication>>, ApiError> {
    let application = service.update(id, &user, request).await?;
    Ok(Json(ApiResponse::ok(application)))
}

/// PUT /api/admin/loanapplications/:id/approve/
pub async fn approve_application(
    AdminUser(admin): AdminUser,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LoanApplication>>, ApiError> {
    let application = service.approve(id, admin.user_id).await?;
    Ok(Json(ApiResponse::ok(application)))
}

/// PUT /api/admin/loanapplications/:id/decline/
pub async fn decline_application(
    AdminUser(admin): AdminUser,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LoanApplication>>, ApiError> {
    let application = service.decline(id, admin.user_id).await?;
    Ok(Json(ApiResponse::ok(application)))
}

/// PUT /api/admin/loanapplications/:id/disburse/
pub async fn disburse_application(
    AdminUser(admin): AdminUser,
    State(loans): State<Arc<LoanService>>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<LoanDetail>>), ApiError> {
    let loan = loans.disburse(id, admin.user_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(loan))))
}
