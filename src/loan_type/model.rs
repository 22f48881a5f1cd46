//! Loan product models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::{Validate, ValidationError};

/// How a loan type's interest rate is applied over the term
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "interest_rate_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterestRateType {
    /// Rate is charged once on the principal
    #[default]
    Flat,
    /// Rate is charged on the principal for every month of the term
    Monthly,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct LoanType {
    pub id: i64,
    pub name: String,
    pub interest_rate_type: InterestRateType,
    /// Percent, e.g. 10.00 for 10%
    pub interest_rate: Decimal,
    pub term_months: i32,
    pub created_at: DateTime<Utc>,
}

fn validate_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() || *rate > Decimal::ONE_HUNDRED || rate.normalize().scale() > 2 {
        return Err(ValidationError::new("interest_rate_out_of_range"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanTypeRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub interest_rate_type: InterestRateType,
    #[validate(custom = "validate_rate")]
    pub interest_rate: Decimal,
    #[validate(range(min = 1, max = 600, message = "term must be 1-600 months"))]
    pub term_months: i32,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLoanTypeRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub interest_rate_type: Option<InterestRateType>,
    #[validate(custom = "validate_rate")]
    pub interest_rate: Option<Decimal>,
    #[validate(range(min = 1, max = 600))]
    pub term_months: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(rate: Decimal, term: i32) -> CreateLoanTypeRequest {
        CreateLoanTypeRequest {
            name: "Salary advance".to_string(),
            interest_rate_type: InterestRateType::Flat,
            interest_rate: rate,
            term_months: term,
        }
    }

    #[test]
    fn test_valid_loan_type() {
        assert!(request(dec!(10.00), 5).validate().is_ok());
        assert!(request(dec!(0), 1).validate().is_ok());
    }

    #[test]
    fn test_rate_and_term_bounds() {
        assert!(request(dec!(-1), 5).validate().is_err());
        assert!(request(dec!(100.01), 5).validate().is_err());
        assert!(request(dec!(10.005), 5).validate().is_err());
        assert!(request(dec!(10), 0).validate().is_err());
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        let req: CreateLoanTypeRequest = serde_json::from_str(
            r#"{"name":"Biz","interest_rate":"10.500","term_months":12}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(request(dec!(99.9900000), 5).validate().is_ok());
        assert!(request(dec!(10.5010), 5).validate().is_err());
    }

    #[test]
    fn test_rate_type_defaults_to_flat() {
        let req: CreateLoanTypeRequest =
            serde_json::from_str(r#"{"name":"Biz","interest_rate":"5.5","term_months":12}"#)
                .unwrap();
        assert_eq!(req.interest_rate_type, InterestRateType::Flat);
        assert_eq!(req.interest_rate, dec!(5.5));
    }
}
