//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::application::ApplicationService;
use crate::auth::AuthService;
use crate::config::Config;
use crate::db::Database;
use crate::loan::LoanService;
use crate::loan_type::LoanTypeService;
use crate::payment::PaymentService;
use crate::services::{CustomerService, SummaryService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth_service: Arc<AuthService>,
    pub customer_service: Arc<CustomerService>,
    pub loan_type_service: Arc<LoanTypeService>,
    pub application_service: Arc<ApplicationService>,
    pub loan_service: Arc<LoanService>,
    pub payment_service: Arc<PaymentService>,
    pub summary_service: Arc<SummaryService>,
}

impl AppState {
    /// Wire every service onto one shared pool
    pub fn new(db: Database, config: &Config) -> Self {
        let pool = db.pool().clone();

        Self {
            auth_service: Arc::new(AuthService::new(
                pool.clone(),
                config.jwt_secret.clone(),
                config.jwt_access_token_ttl_seconds,
                config.bcrypt_cost,
            )),
            customer_service: Arc::new(CustomerService::new(pool.clone())),
            loan_type_service: Arc::new(LoanTypeService::new(pool.clone())),
            application_service: Arc::new(ApplicationService::new(pool.clone())),
            loan_service: Arc::new(LoanService::new(pool.clone())),
            payment_service: Arc::new(PaymentService::new(pool.clone())),
            summary_service: Arc::new(SummaryService::new(pool)),
            db,
        }
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<CustomerService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.customer_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanTypeService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_type_service.clone()
    }
}

impl FromRef<AppState> for Arc<ApplicationService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.application_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_service.clone()
    }
}

impl FromRef<AppState> for Arc<SummaryService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.summary_service.clone()
    }
}
