use chrono::Utc;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::ApiError;
use crate::loan::{Loan, PaymentSchedule};
use crate::middleware::AuthenticatedUser;
use crate::models::{PaginatedResponse, Pagination};
use crate::payment::model::{
    allocate_oldest_first, apply_payment, ListPaymentsQuery, Payment, PaymentReceipt,
    RecordPaymentRequest,
};

#[derive(Debug, sqlx::FromRow)]
struct OwnedPayment {
    #[sqlx(flatten)]
    payment: Payment,
    owner_id: i64,
}

#[derive(Clone)]
pub struct PaymentService {
    db_pool: PgPool,
}

impl PaymentService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Record a repayment against a loan.
    ///
    /// The loan row is locked before its balance is read, so concurrent
    /// payments on the same loan are applied one after another.
    pub async fn record_payment(
        &self,
        request: RecordPaymentRequest,
        recorded_by: i64,
    ) -> Result<PaymentReceipt, ApiError> {
        request.validate()?;

        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(request.loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", request.loan_id)))?;

        let (balance, status) = match apply_payment(loan.balance, loan.status, request.amount_paid)
        {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(
                    loan_id = loan.id,
                    balance = %loan.balance,
                    amount = %request.amount_paid,
                    error = %err,
                    "Payment rejected"
                );
                return Err(err.into());
            }
        };

        let payment_date = request
            .payment_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (loan_id, amount_paid, payment_date, recorded_by, transaction_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(request.amount_paid)
        .bind(payment_date)
        .bind(recorded_by)
        .bind(Uuid::new_v4())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE loans SET balance = $2, status = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(loan.id)
        .bind(balance)
        .bind(status)
        .execute(&mut *tx)
        .await?;

        let schedule = sqlx::query_as::<_, PaymentSchedule>(
            r#"
            SELECT * FROM payment_schedules
            WHERE loan_id = $1 AND NOT is_paid
            ORDER BY installment_number
            "#,
        )
        .bind(loan.id)
        .fetch_all(&mut *tx)
        .await?;

        for update in allocate_oldest_first(&schedule, request.amount_paid) {
            sqlx::query(
                r#"
                UPDATE payment_schedules
                SET amount_paid = $2,
                    is_paid = $3,
                    date_paid = CASE WHEN $3 THEN $4 ELSE date_paid END
                WHERE id = $1
                "#,
            )
            .bind(update.schedule_id)
            .bind(update.amount_paid)
            .bind(update.is_paid)
            .bind(payment_date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            payment_id = payment.id,
            loan_id = loan.id,
            transaction_id = %payment.transaction_id,
            amount = %payment.amount_paid,
            balance = %balance,
            status = ?status,
            recorded_by,
            "Payment recorded"
        );

        Ok(PaymentReceipt {
            payment,
            balance,
            loan_status: status,
        })
    }

    pub async fn list(
        &self,
        requester: &AuthenticatedUser,
        query: ListPaymentsQuery,
    ) -> Result<PaginatedResponse<Payment>, ApiError> {
        let (page, limit, offset) = Pagination {
            page: query.page,
            limit: query.limit,
        }
        .resolve();

        const FROM: &str = " FROM payments p \
             JOIN loans l ON l.id = p.loan_id \
             JOIN loan_applications a ON a.id = l.application_id \
             WHERE 1=1";

        let mut query_builder = QueryBuilder::new(format!("SELECT p.*{}", FROM));
        let mut count_builder = QueryBuilder::new(format!("SELECT COUNT(*){}", FROM));

        if let Some(user_id) = requester.owner_scope() {
            query_builder.push(" AND a.user_id = ");
            query_builder.push_bind(user_id);
            count_builder.push(" AND a.user_id = ");
            count_builder.push_bind(user_id);
        }

        if let Some(loan_id) = query.loan_id {
            query_builder.push(" AND p.loan_id = ");
            query_builder.push_bind(loan_id);
            count_builder.push(" AND p.loan_id = ");
            count_builder.push_bind(loan_id);
        }

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        query_builder.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let data = query_builder
            .build_query_as::<Payment>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            data,
            total,
            page,
            limit,
        })
    }

    pub async fn get(&self, id: i64, requester: &AuthenticatedUser) -> Result<Payment, ApiError> {
        sqlx::query_as::<_, OwnedPayment>(
            r#"
            SELECT p.*, a.user_id AS owner_id
            FROM payments p
            JOIN loans l ON l.id = p.loan_id
            JOIN loan_applications a ON a.id = l.application_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?
        .filter(|owned| requester.can_view(owned.owner_id))
        .map(|owned| owned.payment)
        .ok_or_else(|| ApiError::NotFound(format!("Payment {} not found", id)))
    }
}
