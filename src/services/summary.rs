//! Portfolio summary for the admin dashboard

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::ApiError;

#[derive(Debug, Serialize, sqlx::FromRow, PartialEq)]
pub struct Summary {
    pub total_loans: i64,
    pub active_loans: i64,
    pub paid_loans: i64,
    pub pending_applications: i64,
    pub approved_applications: i64,
    pub rejected_applications: i64,
    pub total_customers: i64,
    pub pending_customers: i64,
    /// Principal disbursed
    pub total_disbursed: Decimal,
    pub total_outstanding: Decimal,
    pub total_collected: Decimal,
}

#[derive(Clone)]
pub struct SummaryService {
    db_pool: PgPool,
}

impl SummaryService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn summary(&self) -> Result<Summary, ApiError> {
        let summary = sqlx::query_as::<_, Summary>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM loans) AS total_loans,
                (SELECT COUNT(*) FROM loans WHERE status = 'active') AS active_loans,
                (SELECT COUNT(*) FROM loans WHERE status = 'paid') AS paid_loans,
                (SELECT COUNT(*) FROM loan_applications WHERE status = 'pending') AS pending_applications,
                (SELECT COUNT(*) FROM loan_applications WHERE status = 'approved') AS approved_applications,
                (SELECT COUNT(*) FROM loan_applications WHERE status = 'rejected') AS rejected_applications,
                (SELECT COUNT(*) FROM users WHERE is_customer) AS total_customers,
                (SELECT COUNT(*) FROM users WHERE is_customer AND NOT is_approved) AS pending_customers,
                (SELECT COALESCE(SUM(amount), 0) FROM loans) AS total_disbursed,
                (SELECT COALESCE(SUM(balance), 0) FROM loans) AS total_outstanding,
                (SELECT COALESCE(SUM(amount_paid), 0) FROM payments) AS total_collected
            "#,
        )
        .fetch_one(&self.db_pool)
        .await?;

        tracing::debug!(
            total_loans = summary.total_loans,
            outstanding = %summary.total_outstanding,
            "Summary computed"
        );

        Ok(summary)
    }
}
