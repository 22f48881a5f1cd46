//! Authentication service
//!
//! Account creation, password login and token issuance.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::config::BootstrapAdmin;
use crate::error::ApiError;
use crate::models::{CustomerProfile, LoginResponse, RegisterRequest, User};

use super::jwt::{generate_access_token, JwtError};
use super::password::{hash_password, verify_password, PasswordError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DatabaseError(e) => e.into(),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::TokenError(_) | AuthError::PasswordError(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        db_pool: PgPool,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            db_pool,
            jwt_secret,
            access_token_ttl_seconds,
            bcrypt_cost,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Create a customer account and its profile in one transaction.
    ///
    /// Self-registered customers start unapproved; `approved_by` marks an
    /// account created directly by an admin.
    pub async fn register_customer(
        &self,
        request: RegisterRequest,
        approved_by: Option<i64>,
    ) -> Result<(User, CustomerProfile), ApiError> {
        let password_hash = hash_password(&request.password, self.bcrypt_cost)
            .await
            .map_err(AuthError::from)?;

        let mut tx = self.db_pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, name, phone_number, password_hash, is_customer, is_staff, is_approved)
            VALUES ($1, $2, $3, $4, TRUE, FALSE, $5)
            RETURNING *
            "#,
        )
        .bind(request.username.trim())
        .bind(request.name.trim())
        .bind(request.phone_number.trim())
        .bind(&password_hash)
        .bind(approved_by.is_some())
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, CustomerProfile>(
            r#"
            INSERT INTO customer_profiles (
                user_id, national_id, email, address, digital_address,
                national_id_front_scan, national_id_back_scan, approved_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(request.national_id.trim())
        .bind(&request.email)
        .bind(&request.address)
        .bind(&request.digital_address)
        .bind(&request.national_id_front_scan)
        .bind(&request.national_id_back_scan)
        .bind(approved_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = user.id,
            username = %user.username,
            pre_approved = user.is_approved,
            "Customer registered"
        );

        Ok((user, profile))
    }

    /// Verify credentials and issue an access token
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username.trim())
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            tracing::warn!(username = %user.username, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let jti = Uuid::new_v4().to_string();
        let token = generate_access_token(
            &user,
            &jti,
            &self.jwt_secret,
            self.access_token_ttl_seconds,
        )?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds,
            user_id: user.id,
            is_admin: user.is_staff,
            is_customer: user.is_customer,
        })
    }

    /// Make sure the configured staff account exists; existing accounts are left untouched
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> Result<(), AuthError> {
        let password_hash = hash_password(&admin.password, self.bcrypt_cost).await?;

        let created = sqlx::query(
            r#"
            INSERT INTO users (username, name, phone_number, password_hash, is_customer, is_staff, is_approved)
            VALUES ($1, $1, $2, $3, FALSE, TRUE, TRUE)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(&admin.username)
        .bind(&admin.phone_number)
        .bind(&password_hash)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if created > 0 {
            tracing::info!(username = %admin.username, "Bootstrap admin account created");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_password_task_is_an_internal_error() {
        let join_err = tokio::spawn(async { panic!("hasher crashed") })
            .await
            .unwrap_err();
        let err: ApiError = AuthError::from(PasswordError::from(join_err)).into();
        assert!(matches!(err, ApiError::InternalError(_)));
    }

    #[test]
    fn test_bad_credentials_are_unauthorized() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
