//! Payment ledger models and balance arithmetic

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::loan::{LoanStatus, PaymentSchedule};
use crate::models::MAX_MONEY;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment amount must be greater than 0")]
    NonPositiveAmount,

    #[error("Payment amount cannot have more than 2 decimal places")]
    TooPrecise,

    #[error("Payment amount cannot exceed {}", MAX_MONEY)]
    TooLarge,

    #[error("Loan is already fully paid")]
    LoanAlreadyPaid,

    #[error("Payment of {requested} exceeds outstanding balance of {balance}")]
    Overpayment { requested: Decimal, balance: Decimal },
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NonPositiveAmount
            | PaymentError::TooPrecise
            | PaymentError::TooLarge => {
                ApiError::ValidationError(err.to_string())
            }
            PaymentError::LoanAlreadyPaid => ApiError::InvalidState(err.to_string()),
            PaymentError::Overpayment { requested, balance } => {
                ApiError::Overpayment { requested, balance }
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Payment {
    pub id: i64,
    pub loan_id: i64,
    pub amount_paid: Decimal,
    pub payment_date: NaiveDate,
    pub recorded_by: Option<i64>,
    pub transaction_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub loan_id: i64,
    pub amount_paid: Decimal,
    /// Defaults to today
    pub payment_date: Option<NaiveDate>,
}

impl RecordPaymentRequest {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.amount_paid <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveAmount);
        }
        if self.amount_paid.normalize().scale() > 2 {
            return Err(PaymentError::TooPrecise);
        }
        if self.amount_paid > MAX_MONEY {
            return Err(PaymentError::TooLarge);
        }
        Ok(())
    }
}

/// Recorded payment plus the loan state it left behind
#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    #[serde(flatten)]
    pub payment: Payment,
    pub balance: Decimal,
    pub loan_status: LoanStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPaymentsQuery {
    pub loan_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Balance and status after paying `amount` against `balance`.
///
/// Overpayment is rejected outright; the balance is never clamped.
pub fn apply_payment(
    balance: Decimal,
    status: LoanStatus,
    amount: Decimal,
) -> Result<(Decimal, LoanStatus), PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::NonPositiveAmount);
    }
    if status == LoanStatus::Paid || balance <= Decimal::ZERO {
        return Err(PaymentError::LoanAlreadyPaid);
    }
    if amount > balance {
        return Err(PaymentError::Overpayment {
            requested: amount,
            balance,
        });
    }

    let remaining = balance - amount;
    let status = if remaining.is_zero() {
        LoanStatus::Paid
    } else {
        LoanStatus::Active
    };
    Ok((remaining, status))
}

/// New cumulative state of one installment after a payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentUpdate {
    pub schedule_id: i64,
    pub amount_paid: Decimal,
    pub is_paid: bool,
}

/// Spread `amount` over outstanding installments, oldest first.
///
/// Returns only the installments whose `amount_paid` changed.
pub fn allocate_oldest_first(
    installments: &[PaymentSchedule],
    amount: Decimal,
) -> Vec<InstallmentUpdate> {
    let mut outstanding: Vec<&PaymentSchedule> =
        installments.iter().filter(|i| !i.is_paid).collect();
    outstanding.sort_by_key(|i| i.installment_number);

    let mut remaining = amount;
    let mut updates = Vec::new();

    for installment in outstanding {
        if remaining <= Decimal::ZERO {
            break;
        }
        let owed = installment.due_amount - installment.amount_paid;
        if owed <= Decimal::ZERO {
            continue;
        }

        let applied = remaining.min(owed);
        remaining -= applied;

        let amount_paid = installment.amount_paid + applied;
        updates.push(InstallmentUpdate {
            schedule_id: installment.id,
            amount_paid,
            is_paid: amount_paid >= installment.due_amount,
        });
    }

    updates
}
