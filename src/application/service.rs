use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::application::model::{
    ApplicationStatus, CreateApplicationRequest, ListApplicationsQuery, LoanApplication,
    UpdateApplicationRequest,
};
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{PaginatedResponse, Pagination, User};

#[derive(Clone)]
pub struct ApplicationService {
    db_pool: PgPool,
}

impl ApplicationService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn submit(
        &self,
        requester: &AuthenticatedUser,
        request: CreateApplicationRequest,
    ) -> Result<LoanApplication, ApiError> {
        request.validate()?;

        let applicant_id = request.user_id.unwrap_or(requester.user_id);
        if !requester.is_admin() && applicant_id != requester.user_id {
            return Err(ApiError::Forbidden(
                "Customers can only apply for themselves".to_string(),
            ));
        }

        let applicant = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(applicant_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", applicant_id)))?;

        if !applicant.is_customer || !applicant.is_approved {
            return Err(ApiError::ValidationError(
                "Only approved customers can apply for a loan".to_string(),
            ));
        }

        let loan_type_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loan_types WHERE id = $1)")
                .bind(request.loan_type_id)
                .fetch_one(&self.db_pool)
                .await?;
        if !loan_type_exists {
            return Err(ApiError::NotFound(format!(
                "Loan type {} not found",
                request.loan_type_id
            )));
        }

        let application = sqlx::query_as::<_, LoanApplication>(
            r#"
            INSERT INTO loan_applications (user_id, loan_type_id, amount, purpose, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(applicant_id)
        .bind(request.loan_type_id)
        .bind(request.amount)
        .bind(request.purpose.trim())
        .bind(ApplicationStatus::Pending)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            application_id = application.id,
            user_id = applicant_id,
            submitted_by = requester.user_id,
            amount = %application.amount,
            "Loan application submitted"
        );

        Ok(application)
    }

    pub async fn list(
        &self,
        requester: &AuthenticatedUser,
        query: ListApplicationsQuery,
    ) -> Result<PaginatedResponse<LoanApplication>, ApiError> {
        let (page, limit, offset) = Pagination {
            page: query.page,
            limit: query.limit,
        }
        .resolve();

        let mut query_builder =
            sqlx::QueryBuilder::new("SELECT * FROM loan_applications WHERE 1=1");
        let mut count_builder =
            sqlx::QueryBuilder::new("SELECT COUNT(*) FROM loan_applications WHERE 1=1");

        // Customers only ever see their own applications
        let owner = requester.owner_scope().or(query.user_id);
        if let Some(user_id) = owner {
            query_builder.push(" AND user_id = ");
            query_builder.push_bind(user_id);
            count_builder.push(" AND user_id = ");
            count_builder.push_bind(user_id);
        }

        if let Some(status) = query.status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
            count_builder.push(" AND status = ");
            count_builder.push_bind(status);
        }

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        query_builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let data = query_builder
            .build_query_as::<LoanApplication>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            data,
            total,
            page,
            limit,
        })
    }

    pub async fn get(
        &self,
        id: i64,
        requester: &AuthenticatedUser,
    ) -> Result<LoanApplication, ApiError> {
        sqlx::query_as::<_, LoanApplication>("SELECT * FROM loan_applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .filter(|application| requester.can_view(application.user_id))
            .ok_or_else(|| not_found(id))
    }

    pub async fn update(
        &self,
        id: i64,
        requester: &AuthenticatedUser,
        request: UpdateApplicationRequest,
    ) -> Result<LoanApplication, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let current = lock_application(&mut tx, id).await?;
        if !requester.can_view(current.user_id) {
            return Err(not_found(id));
        }

        let next_status = request.authorize(requester.is_admin(), current.status)?;

        if let Some(loan_type_id) = request.loan_type_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loan_types WHERE id = $1)")
                    .bind(loan_type_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !exists {
                return Err(ApiError::NotFound(format!(
                    "Loan type {} not found",
                    loan_type_id
                )));
            }
        }

        let approving = next_status == ApplicationStatus::Approved
            && current.status != ApplicationStatus::Approved;

        let application = sqlx::query_as::<_, LoanApplication>(
            r#"
            UPDATE loan_applications
            SET amount = COALESCE($2, amount),
                purpose = COALESCE($3, purpose),
                loan_type_id = COALESCE($4, loan_type_id),
                status = $5,
                approved_by = CASE WHEN $6 THEN $7 ELSE approved_by END,
                date_approved = CASE WHEN $6 THEN $8 ELSE date_approved END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.amount)
        .bind(request.purpose.as_deref().map(str::trim))
        .bind(request.loan_type_id)
        .bind(next_status)
        .bind(approving)
        .bind(requester.user_id)
        .bind(Utc::now().date_naive())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            application_id = id,
            updated_by = requester.user_id,
            status = ?application.status,
            "Loan application updated"
        );

        Ok(application)
    }

    /// pending -> approved
    pub async fn approve(&self, id: i64, admin_id: i64) -> Result<LoanApplication, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let current = lock_application(&mut tx, id).await?;
        let status = current.status.transition(ApplicationStatus::Approved)?;

        let application = sqlx::query_as::<_, LoanApplication>(
            r#"
            UPDATE loan_applications
            SET status = $2, approved_by = $3, date_approved = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(admin_id)
        .bind(Utc::now().date_naive())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(application_id = id, admin_id, "Loan application approved");

        Ok(application)
    }

    /// pending -> rejected
    pub async fn decline(&self, id: i64, admin_id: i64) -> Result<LoanApplication, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let current = lock_application(&mut tx, id).await?;
        let status = current.status.transition(ApplicationStatus::Rejected)?;

        let application = sqlx::query_as::<_, LoanApplication>(
            r#"
            UPDATE loan_applications
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(application_id = id, admin_id, "Loan application declined");

        Ok(application)
    }
}

/// Row-locks an application for the rest of the transaction
pub(crate) async fn lock_application(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> Result<LoanApplication, ApiError> {
    sqlx::query_as::<_, LoanApplication>(
        "SELECT * FROM loan_applications WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| not_found(id))
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Loan application {} not found", id))
}
