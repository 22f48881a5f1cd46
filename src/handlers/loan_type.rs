//! Loan product handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::{AdminUser, AuthenticatedUser};
use crate::error::ApiError;
use crate::loan_type::{CreateLoanTypeRequest, LoanType, LoanTypeService, UpdateLoanTypeRequest};
use crate::models::{ApiResponse, MessageResponse};

pub async fn list_loan_types(
    _user: AuthenticatedUser,
    State(service): State<Arc<LoanTypeService>>,
) -> Result<Json<ApiResponse<Vec<LoanType>>>, ApiError> {
    let loan_types = service.list().await?;
    Ok(Json(ApiResponse::ok(loan_types)))
}

pub async fn get_loan_type(
    _user: AuthenticatedUser,
    State(service): State<Arc<LoanTypeService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LoanType>>, ApiError> {
    let loan_type = service.get(id).await?;
    Ok(Json(ApiResponse::ok(loan_type)))
}

pub async fn create_loan_type(
    _admin: AdminUser,
    State(service): State<Arc<LoanTypeService>>,
    Json(request): Json<CreateLoanTypeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoanType>>), ApiError> {
    request.validate()?;

    let loan_type = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(loan_type))))
}

pub async fn update_loan_type(
    _admin: AdminUser,
    State(service): State<Arc<LoanTypeService>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateLoanTypeRequest>,
) -> Result<Json<ApiResponse<LoanType>>, ApiError> {
    request.validate()?;

    let loan_type = service.update(id, request).await?;
    Ok(Json(ApiResponse::ok(loan_type)))
}

pub async fn delete_loan_type(
    _admin: AdminUser,
    State(service): State<Arc<LoanTypeService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: format!("Loan type {} deleted", id),
    })))
}
