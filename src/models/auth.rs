//! Account and authentication DTOs

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

use super::{CustomerProfile, User};

/// Customer sign-up payload; the scan fields carry references to already uploaded files
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "username must be 3-150 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 7, max = 20, message = "phone number must be 7-20 characters"))]
    pub phone_number: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "national id is required"))]
    pub national_id: String,
    #[validate(email(message = "email is not valid"))]
    pub email: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub digital_address: String,
    pub national_id_front_scan: Option<String>,
    pub national_id_back_scan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: i64,
    pub is_admin: bool,
    pub is_customer: bool,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub phone_number: String,
    pub is_customer: bool,
    pub is_admin: bool,
    pub is_approved: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            is_admin: user.is_staff,
            username: user.username,
            name: user.name,
            phone_number: user.phone_number,
            is_customer: user.is_customer,
            is_approved: user.is_approved,
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub user: UserResponse,
    pub profile: CustomerProfile,
}

/// A user together with their profile
#[derive(Debug, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub user: UserResponse,
    pub profile: Option<CustomerProfile>,
}

/// Own-profile update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 7, max = 20))]
    pub phone_number: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub digital_address: Option<String>,
    pub national_id_front_scan: Option<String>,
    pub national_id_back_scan: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
