use chrono::Utc;
use sqlx::{PgPool, QueryBuilder};

use crate::application::{lock_application, ApplicationStatus};
use crate::error::ApiError;
use crate::loan::model::{ListLoansQuery, Loan, LoanDetail, LoanStatus, PaymentSchedule};
use crate::loan::schedule::build_plan;
use crate::loan_type::LoanType;
use crate::middleware::AuthenticatedUser;
use crate::models::{PaginatedResponse, Pagination};

const LOAN_WITH_OWNER: &str = r#"
    SELECT l.*, a.user_id
    FROM loans l
    JOIN loan_applications a ON a.id = l.application_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct OwnedLoan {
    #[sqlx(flatten)]
    loan: Loan,
    user_id: i64,
}

#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
}

impl LoanService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Turn an approved application into a loan with its full repayment schedule.
    ///
    /// The application row stays locked until commit, so a second disbursement
    /// of the same application waits and then sees `disbursed`.
    pub async fn disburse(&self, application_id: i64, admin_id: i64) -> Result<LoanDetail, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let application = lock_application(&mut tx, application_id).await?;
        let status = application
            .status
            .transition(ApplicationStatus::Disbursed)?;

        let loan_type =
            sqlx::query_as::<_, LoanType>("SELECT * FROM loan_types WHERE id = $1")
                .bind(application.loan_type_id)
                .fetch_one(&mut *tx)
                .await?;

        let today = Utc::now().date_naive();
        let plan = build_plan(
            application.amount,
            loan_type.interest_rate,
            loan_type.interest_rate_type,
            loan_type.term_months,
            today,
        )?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                application_id, amount, interest_rate, term_months,
                total_payable, balance, status, disbursement_date, end_date
            )
            VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(application.id)
        .bind(application.amount)
        .bind(loan_type.interest_rate)
        .bind(loan_type.term_months)
        .bind(plan.total_payable)
        .bind(LoanStatus::Active)
        .bind(today)
        .bind(plan.end_date)
        .fetch_one(&mut *tx)
        .await?;

        let mut insert = QueryBuilder::new(
            "INSERT INTO payment_schedules \
             (loan_id, installment_number, due_date, due_amount, principal_due, interest_due) ",
        );
        insert.push_values(&plan.installments, |mut row, installment| {
            row.push_bind(loan.id)
                .push_bind(installment.installment_number)
                .push_bind(installment.due_date)
                .push_bind(installment.due_amount)
                .push_bind(installment.principal_due)
                .push_bind(installment.interest_due);
        });
        insert.push(" RETURNING *");
        let schedule = insert
            .build_query_as::<PaymentSchedule>()
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE loan_applications
            SET status = $2, date_disbursed = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(application.id)
        .bind(status)
        .bind(today)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            application_id,
            admin_id,
            principal = %loan.amount,
            interest = %plan.interest,
            total_payable = %loan.total_payable,
            installments = schedule.len(),
            "Loan disbursed"
        );

        Ok(LoanDetail {
            loan,
            user_id: application.user_id,
            schedule,
        })
    }

    pub async fn list(
        &self,
        requester: &AuthenticatedUser,
        query: ListLoansQuery,
    ) -> Result<PaginatedResponse<Loan>, ApiError> {
        let (page, limit, offset) = Pagination {
            page: query.page,
            limit: query.limit,
        }
        .resolve();

        let mut query_builder = QueryBuilder::new(
            "SELECT l.* FROM loans l JOIN loan_applications a ON a.id = l.application_id WHERE 1=1",
        );
        let mut count_builder = QueryBuilder::new(
            "SELECT COUNT(*) FROM loans l JOIN loan_applications a ON a.id = l.application_id WHERE 1=1",
        );

        if let Some(user_id) = requester.owner_scope() {
            query_builder.push(" AND a.user_id = ");
            query_builder.push_bind(user_id);
            count_builder.push(" AND a.user_id = ");
            count_builder.push_bind(user_id);
        }

        if let Some(status) = query.status {
            query_builder.push(" AND l.status = ");
            query_builder.push_bind(status);
            count_builder.push(" AND l.status = ");
            count_builder.push_bind(status);
        }

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        query_builder.push(" ORDER BY l.created_at DESC, l.id DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let data = query_builder
            .build_query_as::<Loan>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            data,
            total,
            page,
            limit,
        })
    }

    pub async fn get(&self, id: i64, requester: &AuthenticatedUser) -> Result<LoanDetail, ApiError> {
        let owned = self.visible_loan(id, requester).await?;
        let schedule = self.fetch_schedule(id).await?;

        Ok(LoanDetail {
            loan: owned.loan,
            user_id: owned.user_id,
            schedule,
        })
    }

    pub async fn schedule(
        &self,
        loan_id: i64,
        requester: &AuthenticatedUser,
    ) -> Result<Vec<PaymentSchedule>, ApiError> {
        self.visible_loan(loan_id, requester).await?;
        self.fetch_schedule(loan_id).await
    }

    /// Match on borrower name, username or phone number, or an exact loan id
    pub async fn search(
        &self,
        requester: &AuthenticatedUser,
        q: &str,
    ) -> Result<Vec<Loan>, ApiError> {
        let term = q.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(term));
        let loan_id = term.parse::<i64>().ok();

        let mut query_builder = QueryBuilder::new(
            r#"
            SELECT l.*
            FROM loans l
            JOIN loan_applications a ON a.id = l.application_id
            JOIN users u ON u.id = a.user_id
            WHERE (u.name ILIKE "#,
        );
        query_builder.push_bind(pattern.clone());
        query_builder.push(" OR u.username ILIKE ");
        query_builder.push_bind(pattern.clone());
        query_builder.push(" OR u.phone_number ILIKE ");
        query_builder.push_bind(pattern);
        query_builder.push(" OR l.id = ");
        query_builder.push_bind(loan_id);
        query_builder.push(")");

        if let Some(user_id) = requester.owner_scope() {
            query_builder.push(" AND a.user_id = ");
            query_builder.push_bind(user_id);
        }

        query_builder.push(" ORDER BY l.created_at DESC, l.id DESC LIMIT 100");

        let loans = query_builder
            .build_query_as::<Loan>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(loans)
    }

    async fn visible_loan(
        &self,
        id: i64,
        requester: &AuthenticatedUser,
    ) -> Result<OwnedLoan, ApiError> {
        let sql = format!("{} WHERE l.id = $1", LOAN_WITH_OWNER);
        sqlx::query_as::<_, OwnedLoan>(&sql)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .filter(|owned| requester.can_view(owned.user_id))
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))
    }

    async fn fetch_schedule(&self, loan_id: i64) -> Result<Vec<PaymentSchedule>, ApiError> {
        let schedule = sqlx::query_as::<_, PaymentSchedule>(
            "SELECT * FROM payment_schedules WHERE loan_id = $1 ORDER BY installment_number",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(schedule)
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("kofi"), "kofi");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
