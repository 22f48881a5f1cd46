//! Registration, login and own-profile handlers

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use super::AuthenticatedUser;
use crate::auth::AuthService;
use crate::error::ApiError;
use crate::models::{
    ApiResponse, CustomerDetail, LoginRequest, LoginResponse, RegisterRequest,
    RegistrationResponse, UpdateProfileRequest,
};
use crate::services::CustomerService;

/// POST /api/register/ - Customer self sign-up; the account awaits admin approval
pub async fn register(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    request.validate()?;

    let (user, profile) = auth.register_customer(request, None).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            message: "Registration successful. Your account is awaiting approval.".to_string(),
            user: user.into(),
            profile,
        }),
    ))
}

/// POST /api/login/
pub async fn login(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = auth.login(&request.username, &request.password).await?;
    Ok(Json(response))
}

/// GET /api/profile/
pub async fn get_profile(
    user: AuthenticatedUser,
    State(customers): State<Arc<CustomerService>>,
) -> Result<Json<ApiResponse<CustomerDetail>>, ApiError> {
    let detail = customers.get_detail(user.user_id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// PUT /api/profile/
pub async fn update_profile(
    user: AuthenticatedUser,
    State(customers): State<Arc<CustomerService>>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<CustomerDetail>>, ApiError> {
    request.validate()?;

    let detail = customers.update_profile(user.user_id, request).await?;
    Ok(Json(ApiResponse::ok(detail)))
}
