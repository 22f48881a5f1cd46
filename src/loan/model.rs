//! Loan and repayment schedule models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};

/// Loan status; `paid` exactly when the balance is zero
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Paid,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Loan {
    pub id: i64,
    pub application_id: i64,
    /// Principal
    pub amount: Decimal,
    pub interest_rate: Decimal,
    pub term_months: i32,
    pub total_payable: Decimal,
    pub balance: Decimal,
    pub status: LoanStatus,
    pub disbursement_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of a loan's amortization schedule
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct PaymentSchedule {
    pub id: i64,
    pub loan_id: i64,
    pub installment_number: i32,
    pub due_date: NaiveDate,
    pub due_amount: Decimal,
    pub principal_due: Decimal,
    pub interest_due: Decimal,
    pub amount_paid: Decimal,
    pub is_paid: bool,
    pub date_paid: Option<NaiveDate>,
}

/// Loan together with its owner and schedule
#[derive(Debug, Serialize)]
pub struct LoanDetail {
    #[serde(flatten)]
    pub loan: Loan,
    pub user_id: i64,
    pub schedule: Vec<PaymentSchedule>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    pub status: Option<LoanStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LoanSearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub loan_id: i64,
}
