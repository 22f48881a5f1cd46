use sqlx::PgPool;

use crate::error::ApiError;
use crate::loan_type::model::{CreateLoanTypeRequest, LoanType, UpdateLoanTypeRequest};

/// Catalog of loan products
#[derive(Clone)]
pub struct LoanTypeService {
    db_pool: PgPool,
}

impl LoanTypeService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create(&self, request: CreateLoanTypeRequest) -> Result<LoanType, ApiError> {
        let loan_type = sqlx::query_as::<_, LoanType>(
            r#"
            INSERT INTO loan_types (name, interest_rate_type, interest_rate, term_months)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.name.trim())
        .bind(request.interest_rate_type)
        .bind(request.interest_rate)
        .bind(request.term_months)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            loan_type_id = loan_type.id,
            name = %loan_type.name,
            rate = %loan_type.interest_rate,
            term_months = loan_type.term_months,
            "Loan type created"
        );

        Ok(loan_type)
    }

    pub async fn get(&self, id: i64) -> Result<LoanType, ApiError> {
        sqlx::query_as::<_, LoanType>("SELECT * FROM loan_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan type {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<LoanType>, ApiError> {
        let loan_types = sqlx::query_as::<_, LoanType>("SELECT * FROM loan_types ORDER BY name, id")
            .fetch_all(&self.db_pool)
            .await?;
        Ok(loan_types)
    }

    /// Terms of existing loans are copied at disbursement, so edits only affect future loans
    pub async fn update(
        &self,
        id: i64,
        request: UpdateLoanTypeRequest,
    ) -> Result<LoanType, ApiError> {
        let loan_type = sqlx::query_as::<_, LoanType>(
            r#"
            UPDATE loan_types
            SET name = COALESCE($2, name),
                interest_rate_type = COALESCE($3, interest_rate_type),
                interest_rate = COALESCE($4, interest_rate),
                term_months = COALESCE($5, term_months)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.interest_rate_type)
        .bind(request.interest_rate)
        .bind(request.term_months)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Loan type {} not found", id)))?;

        tracing::info!(loan_type_id = id, "Loan type updated");

        Ok(loan_type)
    }

    /// Fails with `Conflict` while applications still reference the type
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM loan_types WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Loan type {} not found", id)));
        }

        tracing::info!(loan_type_id = id, "Loan type deleted");
        Ok(())
    }
}
