//! Loan application models and the application state machine

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::ApiError;
use crate::models::MAX_MONEY;

/// Application status
///
/// ```text
/// pending --approve--> approved --disburse--> disbursed
/// pending --reject---> rejected
/// ```
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Disbursed,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Cannot move application from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        ApiError::InvalidState(err.to_string())
    }
}

impl ApplicationStatus {
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Disbursed)
        )
    }

    pub fn transition(self, next: ApplicationStatus) -> Result<ApplicationStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Disbursed)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct LoanApplication {
    pub id: i64,
    pub user_id: i64,
    pub loan_type_id: i64,
    pub amount: Decimal,
    pub purpose: String,
    pub status: ApplicationStatus,
    pub approved_by: Option<i64>,
    pub date_approved: Option<NaiveDate>,
    pub date_disbursed: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Amounts are money: strictly positive with at most two decimal places
pub fn validate_amount(amount: Decimal) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::ValidationError(
            "Amount must be greater than 0".to_string(),
        ));
    }
    if amount.normalize().scale() > 2 {
        return Err(ApiError::ValidationError(
            "Amount cannot have more than 2 decimal places".to_string(),
        ));
    }
    if amount > MAX_MONEY {
        return Err(ApiError::ValidationError(format!(
            "Amount cannot exceed {}",
            MAX_MONEY
        )));
    }
    Ok(())
}

/// Request DTO for submitting an application
#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub loan_type_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub purpose: String,
    /// Admins may apply on behalf of a customer
    pub user_id: Option<i64>,
}

impl CreateApplicationRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_amount(self.amount)?;
        if self.purpose.len() > 2000 {
            return Err(ApiError::ValidationError(
                "Purpose must be at most 2000 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update of an application; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateApplicationRequest {
    pub amount: Option<Decimal>,
    pub purpose: Option<String>,
    pub loan_type_id: Option<i64>,
    pub status: Option<ApplicationStatus>,
}

impl UpdateApplicationRequest {
    /// Decide whether the requester may apply this update to an application in
    /// `current` state. Returns the status the application ends up in.
    pub fn authorize(
        &self,
        requester_is_admin: bool,
        current: ApplicationStatus,
    ) -> Result<ApplicationStatus, ApiError> {
        if !requester_is_admin && (self.status.is_some() || self.amount.is_some()) {
            return Err(ApiError::Forbidden(
                "Only admins can change the status or amount of an application".to_string(),
            ));
        }

        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }

        let edits_terms =
            self.amount.is_some() || self.loan_type_id.is_some() || self.purpose.is_some();
        if edits_terms && current != ApplicationStatus::Pending {
            return Err(ApiError::InvalidState(format!(
                "Application is {:?}; only pending applications can be edited",
                current
            )));
        }

        match self.status {
            None => Ok(current),
            Some(next) if next == current => Ok(current),
            Some(ApplicationStatus::Disbursed) => Err(ApiError::InvalidState(
                "Applications are disbursed through the disburse endpoint".to_string(),
            )),
            Some(next) => Ok(current.transition(next)?),
        }
    }
}

/// Query parameters for listing applications
#[derive(Debug, Default, Deserialize)]
pub struct ListApplicationsQuery {
    pub status: Option<ApplicationStatus>,
    pub user_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use ApplicationStatus::*;

    #[test]
    fn test_allowed_transitions() {
        assert_eq!(Pending.transition(Approved), Ok(Approved));
        assert_eq!(Pending.transition(Rejected), Ok(Rejected));
        assert_eq!(Approved.transition(Disbursed), Ok(Disbursed));
    }

    #[test]
    fn test_transitions_are_one_directional() {
        for (from, to) in [
            (Approved, Pending),
            (Rejected, Pending),
            (Rejected, Approved),
            (Disbursed, Approved),
            (Disbursed, Disbursed),
            (Pending, Disbursed),
            (Approved, Rejected),
        ] {
            assert_eq!(from.transition(to), Err(TransitionError { from, to }));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(Rejected.is_terminal());
        assert!(Disbursed.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Approved.is_terminal());
    }

    #[test]
    fn test_amount_validation() {
        assert!(validate_amount(dec!(1000)).is_ok());
        assert!(validate_amount(dec!(0.01)).is_ok());
        assert!(validate_amount(dec!(10.50)).is_ok());
        assert!(matches!(
            validate_amount(dec!(0)),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            validate_amount(dec!(-5)),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            validate_amount(dec!(1.001)),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_amount_must_fit_money_column() {
        assert!(validate_amount(MAX_MONEY).is_ok());
        assert!(matches!(
            validate_amount(dec!(1000000000000)),
            Err(ApiError::ValidationError(_))
        ));

        let create = CreateApplicationRequest {
            loan_type_id: 1,
            amount: dec!(99999999999999999),
            purpose: String::new(),
            user_id: None,
        };
        assert!(matches!(
            create.validate(),
            Err(ApiError::ValidationError(_))
        ));

        let update = UpdateApplicationRequest {
            amount: Some(dec!(1000000000000.00)),
            ..Default::default()
        };
        assert!(matches!(
            update.authorize(true, Pending),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_customer_cannot_change_status_or_amount() {
        let update = UpdateApplicationRequest {
            status: Some(Approved),
            ..Default::default()
        };
        assert!(matches!(
            update.authorize(false, Pending),
            Err(ApiError::Forbidden(_))
        ));

        let update = UpdateApplicationRequest {
            amount: Some(dec!(2000)),
            ..Default::default()
        };
        assert!(matches!(
            update.authorize(false, Pending),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_customer_can_edit_purpose_while_pending() {
        let update = UpdateApplicationRequest {
            purpose: Some("School fees".to_string()),
            ..Default::default()
        };
        assert_eq!(update.authorize(false, Pending).unwrap(), Pending);
        assert!(matches!(
            update.authorize(false, Approved),
            Err(ApiError::InvalidState(_))
        ));
    }

    #[test]
    fn test_admin_status_update_follows_state_machine() {
        let approve = UpdateApplicationRequest {
            status: Some(Approved),
            ..Default::default()
        };
        assert_eq!(approve.authorize(true, Pending).unwrap(), Approved);
        assert!(matches!(
            approve.authorize(true, Rejected),
            Err(ApiError::InvalidState(_))
        ));

        let disburse = UpdateApplicationRequest {
            status: Some(Disbursed),
            ..Default::default()
        };
        assert!(matches!(
            disburse.authorize(true, Approved),
            Err(ApiError::InvalidState(_))
        ));
    }

    #[test]
    fn test_admin_amount_update_validated() {
        let update = UpdateApplicationRequest {
            amount: Some(dec!(0)),
            ..Default::default()
        };
        assert!(matches!(
            update.authorize(true, Pending),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Disbursed).unwrap(), "\"disbursed\"");
        let parsed: ApplicationStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, Pending);
    }
}
