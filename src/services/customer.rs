//! Customer administration and self-service profile

use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::{
    CustomerDetail, CustomerProfile, PaginatedResponse, Pagination, UpdateProfileRequest, User,
};

#[derive(Clone)]
pub struct CustomerService {
    db_pool: PgPool,
}

impl CustomerService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Customers ordered by id, with their profiles
    pub async fn list_customers(
        &self,
        pagination: Pagination,
    ) -> Result<PaginatedResponse<CustomerDetail>, ApiError> {
        let (page, limit, offset) = pagination.resolve();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_customer")
            .fetch_one(&self.db_pool)
            .await?;

        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE is_customer ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let mut profiles = sqlx::query_as::<_, CustomerProfile>(
            "SELECT * FROM customer_profiles WHERE user_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.db_pool)
        .await?;

        let data = users
            .into_iter()
            .map(|user| {
                let profile = profiles
                    .iter()
                    .position(|p| p.user_id == user.id)
                    .map(|idx| profiles.swap_remove(idx));
                CustomerDetail {
                    user: user.into(),
                    profile,
                }
            })
            .collect();

        Ok(PaginatedResponse {
            data,
            total,
            page,
            limit,
        })
    }

    pub async fn get_detail(&self, user_id: i64) -> Result<CustomerDetail, ApiError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", user_id)))?;

        let profile = sqlx::query_as::<_, CustomerProfile>(
            "SELECT * FROM customer_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(CustomerDetail {
            user: user.into(),
            profile,
        })
    }

    /// Approve a self-registered customer so they can apply for loans
    pub async fn approve_customer(
        &self,
        user_id: i64,
        admin_id: i64,
    ) -> Result<CustomerDetail, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND is_customer FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Customer {} not found", user_id)))?;

        if user.is_approved {
            return Err(ApiError::Conflict(format!(
                "Customer {} is already approved",
                user_id
            )));
        }

        sqlx::query("UPDATE users SET is_approved = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE customer_profiles SET approved_by = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(admin_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id, admin_id, "Customer approved");

        self.get_detail(user_id).await
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> Result<CustomerDetail, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone_number = COALESCE($3, phone_number)
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.phone_number.as_deref().map(str::trim))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(ApiError::NotFound(format!("User {} not found", user_id)));
        }

        // Staff accounts have no profile row; nothing to update there
        sqlx::query(
            r#"
            UPDATE customer_profiles
            SET email = COALESCE($2, email),
                address = COALESCE($3, address),
                digital_address = COALESCE($4, digital_address),
                national_id_front_scan = COALESCE($5, national_id_front_scan),
                national_id_back_scan = COALESCE($6, national_id_back_scan)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&request.email)
        .bind(&request.address)
        .bind(&request.digital_address)
        .bind(&request.national_id_front_scan)
        .bind(&request.national_id_back_scan)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id, "Profile updated");

        self.get_detail(user_id).await
    }
}
