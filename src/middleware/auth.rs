//! Authentication middleware
//!
//! Extractors for JWT token verification and role checks.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{get_user_id_from_claims, verify_token, AuthService, JwtError};
use crate::models::UserRole;

/// Authenticated user extracted from JWT token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    pub jti: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Row-level visibility: admins see everything, customers only what they own
    pub fn can_view(&self, owner_id: i64) -> bool {
        self.is_admin() || self.user_id == owner_id
    }

    /// Owner filter for list queries; `None` means unrestricted
    pub fn owner_scope(&self) -> Option<i64> {
        if self.is_admin() {
            None
        } else {
            Some(self.user_id)
        }
    }
}

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthError {
    error: AuthErrorDetails,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetails {
    code: String,
    message: String,
}

impl AuthError {
    fn response(status: StatusCode, code: &str, message: &str) -> Response {
        let body = Self {
            error: AuthErrorDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }

    fn unauthorized(code: &str, message: &str) -> Response {
        Self::response(StatusCode::UNAUTHORIZED, code, message)
    }
}

/// Extractor for authenticated users
///
/// This extractor verifies the JWT token from the Authorization header
/// and extracts the authenticated user information.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthError::unauthorized(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = verify_token(bearer.token(), auth_service.jwt_secret()).map_err(|e| match e {
            JwtError::TokenExpired => AuthError::unauthorized("TOKEN_EXPIRED", "Token has expired"),
            _ => AuthError::unauthorized("INVALID_TOKEN", "Invalid token"),
        })?;

        let user_id = get_user_id_from_claims(&claims)
            .map_err(|_| AuthError::unauthorized("INVALID_TOKEN", "Invalid user ID in token"))?;

        let role = UserRole::parse(&claims.role)
            .ok_or_else(|| AuthError::unauthorized("INVALID_TOKEN", "Invalid role in token"))?;

        Ok(AuthenticatedUser {
            user_id,
            username: claims.username,
            role,
            jti: claims.jti,
        })
    }
}

/// Extractor that additionally requires the admin role
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::debug!(user_id = user.user_id, "Admin access denied");
            return Err(AuthError::response(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Admin access required",
            ));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: id,
            username: format!("user{}", id),
            role,
            jti: "jti".to_string(),
        }
    }

    #[test]
    fn test_customer_sees_only_own_rows() {
        let customer = user(7, UserRole::Customer);
        assert!(customer.can_view(7));
        assert!(!customer.can_view(8));
        assert_eq!(customer.owner_scope(), Some(7));
    }

    #[test]
    fn test_admin_sees_everything() {
        let admin = user(1, UserRole::Admin);
        assert!(admin.can_view(7));
        assert!(admin.can_view(1));
        assert_eq!(admin.owner_scope(), None);
    }
}
