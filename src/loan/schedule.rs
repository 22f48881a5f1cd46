//! Interest and amortization math
//!
//! Pure functions with no database access; disbursement feeds the result
//! straight into the `loans` and `payment_schedules` tables.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::error::ApiError;
use crate::loan_type::InterestRateType;
use crate::models::MAX_MONEY;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Principal must be greater than 0")]
    InvalidPrincipal,

    #[error("Interest rate cannot be negative")]
    NegativeRate,

    #[error("Term must be at least one month, got {0}")]
    InvalidTerm(i32),

    #[error("Due date out of range for installment {0}")]
    DateOverflow(i32),

    #[error("Total payable of {0} exceeds the largest supported amount")]
    AmountTooLarge(Decimal),
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::DateOverflow(_) => ApiError::InternalError(err.to_string()),
            _ => ApiError::ValidationError(err.to_string()),
        }
    }
}

/// Round to cents, ties away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Total interest over the life of the loan
pub fn total_interest(
    principal: Decimal,
    rate: Decimal,
    rate_type: InterestRateType,
    term_months: i32,
) -> Decimal {
    let per_period = principal * rate / Decimal::ONE_HUNDRED;
    let interest = match rate_type {
        InterestRateType::Flat => per_period,
        InterestRateType::Monthly => per_period * Decimal::from(term_months),
    };
    round_money(interest)
}

/// Split `total` into `parts` cent amounts summing exactly to `total`.
///
/// Every part but the last is `total / parts` rounded half-up; the last one
/// takes the remainder. When rounding up would overshoot, the share is
/// truncated instead so the remainder never goes negative.
pub fn split_evenly(total: Decimal, parts: u32) -> Vec<Decimal> {
    if parts == 0 {
        return Vec::new();
    }

    let count = Decimal::from(parts);
    let leading = Decimal::from(parts - 1);
    let exact = total / count;

    let mut share = round_money(exact);
    if share * leading > total {
        share = exact.round_dp_with_strategy(2, RoundingStrategy::ToZero);
    }

    let mut shares = vec![share; parts as usize - 1];
    shares.push(total - share * leading);
    shares
}

/// Interest carried by each installment, never more than the installment itself.
///
/// Starts from an even split of `interest`; whatever an installment cannot hold
/// moves forward, and anything still left at the end fills the earliest
/// installments that have room. The result sums to `interest` whenever
/// `interest` is no more than the sum of `due`.
pub fn interest_portions(due: &[Decimal], interest: Decimal) -> Vec<Decimal> {
    let shares = split_evenly(interest, due.len() as u32);

    let mut carry = Decimal::ZERO;
    let mut portions: Vec<Decimal> = due
        .iter()
        .zip(shares)
        .map(|(due_amount, share)| {
            let wanted = share + carry;
            let take = wanted.min(*due_amount);
            carry = wanted - take;
            take
        })
        .collect();

    for (portion, due_amount) in portions.iter_mut().zip(due) {
        if carry.is_zero() {
            break;
        }
        let extra = (*due_amount - *portion).min(carry);
        *portion += extra;
        carry -= extra;
    }

    portions
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installment {
    pub installment_number: i32,
    pub due_date: NaiveDate,
    pub due_amount: Decimal,
    pub principal_due: Decimal,
    pub interest_due: Decimal,
}

/// Repayment terms derived from a principal and a loan product
#[derive(Debug, Clone)]
pub struct LoanPlan {
    pub interest: Decimal,
    pub total_payable: Decimal,
    pub end_date: NaiveDate,
    pub installments: Vec<Installment>,
}

pub fn build_plan(
    principal: Decimal,
    rate: Decimal,
    rate_type: InterestRateType,
    term_months: i32,
    disbursement_date: NaiveDate,
) -> Result<LoanPlan, ScheduleError> {
    if principal <= Decimal::ZERO {
        return Err(ScheduleError::InvalidPrincipal);
    }
    if rate.is_sign_negative() {
        return Err(ScheduleError::NegativeRate);
    }
    let parts = u32::try_from(term_months)
        .ok()
        .filter(|n| *n > 0)
        .ok_or(ScheduleError::InvalidTerm(term_months))?;

    let interest = total_interest(principal, rate, rate_type, term_months);
    let total_payable = principal + interest;
    if total_payable > MAX_MONEY {
        return Err(ScheduleError::AmountTooLarge(total_payable));
    }

    let due = split_evenly(total_payable, parts);
    let interest_shares = interest_portions(&due, interest);

    let installments = due
        .into_iter()
        .zip(interest_shares)
        .zip(1..=term_months)
        .map(|((due_amount, interest_due), number)| {
            let due_date = disbursement_date
                .checked_add_months(Months::new(number as u32))
                .ok_or(ScheduleError::DateOverflow(number))?;
            Ok(Installment {
                installment_number: number,
                due_date,
                due_amount,
                principal_due: due_amount - interest_due,
                interest_due,
            })
        })
        .collect::<Result<Vec<_>, ScheduleError>>()?;

    let end_date = installments
        .last()
        .map(|i| i.due_date)
        .ok_or(ScheduleError::InvalidTerm(term_months))?;

    Ok(LoanPlan {
        interest,
        total_payable,
        end_date,
        installments,
    })
}
