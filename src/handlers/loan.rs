//! Loan and repayment schedule handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::loan::{
    ListLoansQuery, Loan, LoanDetail, LoanSearchQuery, LoanService, PaymentSchedule,
    ScheduleQuery,
};
use crate::models::{ApiResponse, PaginatedResponse};

pub async fn list_loans(
    user: AuthenticatedUser,
    State(service): State<Arc<LoanService>>,
    Query(query): Query<ListLoansQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<Loan>>>, ApiError> {
    let page = service.list(&user, query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_loan(
    user: AuthenticatedUser,
    State(service): State<Arc<LoanService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LoanDetail>>, ApiError> {
    let loan = service.get(id, &user).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// GET /api/loans/:id/schedule/
pub async fn get_loan_schedule(
    user: AuthenticatedUser,
    State(service): State<Arc<LoanService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<PaymentSchedule>>>, ApiError> {
    let schedule = service.schedule(id, &user).await?;
    Ok(Json(ApiResponse::ok(schedule)))
}

/// GET /api/payment-schedules/?loan_id=
pub async fn list_payment_schedules(
    user: AuthenticatedUser,
    State(service): State<Arc<LoanService>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ApiResponse<Vec<PaymentSchedule>>>, ApiError> {
    let schedule = service.schedule(query.loan_id, &user).await?;
    Ok(Json(ApiResponse::ok(schedule)))
}

/// GET /api/loans/search/?q=
pub async fn search_loans(
    user: AuthenticatedUser,
    State(service): State<Arc<LoanService>>,
    Query(query): Query<LoanSearchQuery>,
) -> Result<Json<ApiResponse<Vec<Loan>>>, ApiError> {
    let loans = service.search(&user, &query.q).await?;
    Ok(Json(ApiResponse::ok(loans)))
}
