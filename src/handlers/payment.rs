//! Payment ledger handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{AdminUser, AuthenticatedUser};
use crate::error::ApiError;
use crate::models::{ApiResponse, PaginatedResponse};
use crate::payment::{
    ListPaymentsQuery, Payment, PaymentReceipt, PaymentService, RecordPaymentRequest,
};

pub async fn list_payments(
    user: AuthenticatedUser,
    State(service): State<Arc<PaymentService>>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<Payment>>>, ApiError> {
    let page = service.list(&user, query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/payments/ - Admin records a repayment
pub async fn record_payment(
    AdminUser(admin): AdminUser,
    State(service): State<Arc<PaymentService>>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentReceipt>>), ApiError> {
    let receipt = service.record_payment(request, admin.user_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(receipt))))
}

pub async fn get_payment(
    user: AuthenticatedUser,
    State(service): State<Arc<PaymentService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Payment>>, ApiError> {
    let payment = service.get(id, &user).await?;
    Ok(Json(ApiResponse::ok(payment)))
}
