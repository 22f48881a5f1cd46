//! Shared data models for the loan ledger backend

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};

pub mod auth;
pub use auth::*;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_customer: bool,
    pub is_staff: bool,
    pub is_approved: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> UserRole {
        if self.is_staff {
            UserRole::Admin
        } else {
            UserRole::Customer
        }
    }
}

/// User roles
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(UserRole::Customer),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Customer profile with references to the uploaded ID scans
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct CustomerProfile {
    pub user_id: i64,
    pub national_id: String,
    pub email: Option<String>,
    pub address: String,
    pub digital_address: String,
    pub national_id_front_scan: Option<String>,
    pub national_id_back_scan: Option<String>,
    pub approved_by: Option<i64>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Paginated response
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Page/limit query parameters shared by list endpoints
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Largest amount a NUMERIC(14,2) money column can hold
pub const MAX_MONEY: Decimal = dec!(999999999999.99);

/// Highest page a list endpoint will seek to
pub const MAX_PAGE: i64 = 1_000_000;

impl Pagination {
    /// Normalized (page, limit, offset); page is clamped to 1..=MAX_PAGE, limit to 1..=100
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        (page, limit, (page - 1) * limit)
    }
}
