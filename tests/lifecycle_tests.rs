//! End-to-end loan lifecycle against a real database
//!
//! Run with `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sqlx::PgPool;
    use tokio::sync::{Mutex, MutexGuard};
    use uuid::Uuid;

    use loan_ledger_server::application::{
        ApplicationService, ApplicationStatus, CreateApplicationRequest, ListApplicationsQuery,
        UpdateApplicationRequest,
    };
    use loan_ledger_server::auth::AuthService;
    use loan_ledger_server::config::BootstrapAdmin;
    use loan_ledger_server::db::{check_health, run_migrations};
    use loan_ledger_server::error::ApiError;
    use loan_ledger_server::loan::{ListLoansQuery, LoanService, LoanStatus};
    use loan_ledger_server::loan_type::{
        CreateLoanTypeRequest, InterestRateType, LoanTypeService,
    };
    use loan_ledger_server::middleware::AuthenticatedUser;
    use loan_ledger_server::models::{RegisterRequest, UserRole};
    use loan_ledger_server::payment::{ListPaymentsQuery, PaymentService, RecordPaymentRequest};
    use loan_ledger_server::services::{Summary, SummaryService};

    // Summary assertions compare global counts, so tests sharing the database run one at a time
    static DB_LOCK: Mutex<()> = Mutex::const_new(());

    /// Helper to create a migrated test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/loan_ledger_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        run_migrations(&pool).await.expect("migrations");
        pool
    }

    struct Fixture {
        _guard: MutexGuard<'static, ()>,
        pool: PgPool,
        admin: AuthenticatedUser,
        customer: AuthenticatedUser,
        applications: ApplicationService,
        loans: LoanService,
        payments: PaymentService,
        loan_types: LoanTypeService,
    }

    fn requester(user_id: i64, role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id,
            username: format!("user{}", user_id),
            role,
            jti: Uuid::new_v4().to_string(),
        }
    }

    fn unique_digits(len: usize) -> String {
        let digits = Uuid::new_v4().as_u128().to_string();
        digits[..len].to_string()
    }

    async fn new_customer(auth: &AuthService, approved_by: Option<i64>) -> i64 {
        let tag = unique_digits(9);
        let (user, _) = auth
            .register_customer(
                RegisterRequest {
                    username: format!("customer{}", tag),
                    name: format!("Kwame Asante {}", tag),
                    phone_number: format!("024{}", tag),
                    password: "correct horse battery".to_string(),
                    national_id: format!("GHA-{}", tag),
                    email: None,
                    address: "12 Ring Road".to_string(),
                    digital_address: "GA-123-4567".to_string(),
                    national_id_front_scan: None,
                    national_id_back_scan: None,
                },
                approved_by,
            )
            .await
            .expect("register customer");
        user.id
    }

    async fn setup() -> Fixture {
        let guard = DB_LOCK.lock().await;
        let pool = setup_test_db().await;
        let auth = AuthService::new(pool.clone(), "lifecycle-secret".to_string(), 3600, 4);

        let admin_name = format!("admin{}", unique_digits(9));
        auth.ensure_admin(&BootstrapAdmin {
            username: admin_name.clone(),
            password: "admin-password".to_string(),
            phone_number: format!("020{}", unique_digits(9)),
        })
        .await
        .expect("admin");
        let admin_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
            .bind(&admin_name)
            .fetch_one(&pool)
            .await
            .unwrap();

        let customer_id = new_customer(&auth, Some(admin_id)).await;

        Fixture {
            _guard: guard,
            admin: requester(admin_id, UserRole::Admin),
            customer: requester(customer_id, UserRole::Customer),
            applications: ApplicationService::new(pool.clone()),
            loans: LoanService::new(pool.clone()),
            payments: PaymentService::new(pool.clone()),
            loan_types: LoanTypeService::new(pool.clone()),
            pool,
        }
    }

    /// Approved application for `amount` on a fresh loan type
    async fn approved_application(
        f: &Fixture,
        amount: Decimal,
        rate: Decimal,
        term_months: i32,
    ) -> i64 {
        let loan_type = f
            .loan_types
            .create(CreateLoanTypeRequest {
                name: format!("Product {}", unique_digits(6)),
                interest_rate_type: InterestRateType::Flat,
                interest_rate: rate,
                term_months,
            })
            .await
            .unwrap();

        let application = f
            .applications
            .submit(
                &f.customer,
                CreateApplicationRequest {
                    loan_type_id: loan_type.id,
                    amount,
                    purpose: "Shop inventory".to_string(),
                    user_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);

        let approved = f
            .applications
            .approve(application.id, f.admin.user_id)
            .await
            .unwrap();
        assert_eq!(approved.status, ApplicationStatus::Approved);
        assert_eq!(approved.approved_by, Some(f.admin.user_id));

        application.id
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_full_lifecycle() {
        let f = setup().await;
        let application_id = approved_application(&f, dec!(1000), dec!(10), 5).await;

        let disbursed = f
            .loans
            .disburse(application_id, f.admin.user_id)
            .await
            .unwrap();
        assert_eq!(disbursed.loan.amount, dec!(1000));
        assert_eq!(disbursed.loan.total_payable, dec!(1100));
        assert_eq!(disbursed.loan.balance, dec!(1100));
        assert_eq!(disbursed.loan.status, LoanStatus::Active);
        assert_eq!(disbursed.schedule.len(), 5);
        assert!(disbursed.schedule.iter().all(|s| s.due_amount == dec!(220)));

        let application = f
            .applications
            .get(application_id, &f.customer)
            .await
            .unwrap();
        assert_eq!(application.status, ApplicationStatus::Disbursed);
        assert!(application.date_disbursed.is_some());

        let loan_id = disbursed.loan.id;

        let receipt = f
            .payments
            .record_payment(
                RecordPaymentRequest {
                    loan_id,
                    amount_paid: dec!(300),
                    payment_date: None,
                },
                f.admin.user_id,
            )
            .await
            .unwrap();
        assert_eq!(receipt.balance, dec!(800));
        assert_eq!(receipt.loan_status, LoanStatus::Active);

        let schedule = f.loans.schedule(loan_id, &f.customer).await.unwrap();
        assert!(schedule[0].is_paid);
        assert!(schedule[0].date_paid.is_some());
        assert_eq!(schedule[1].amount_paid, dec!(80));
        assert!(!schedule[1].is_paid);

        let receipt = f
            .payments
            .record_payment(
                RecordPaymentRequest {
                    loan_id,
                    amount_paid: dec!(800),
                    payment_date: None,
                },
                f.admin.user_id,
            )
            .await
            .unwrap();
        assert_eq!(receipt.balance, Decimal::ZERO);
        assert_eq!(receipt.loan_status, LoanStatus::Paid);

        let schedule = f.loans.schedule(loan_id, &f.customer).await.unwrap();
        assert!(schedule.iter().all(|s| s.is_paid));

        let err = f
            .payments
            .record_payment(
                RecordPaymentRequest {
                    loan_id,
                    amount_paid: dec!(1),
                    payment_date: None,
                },
                f.admin.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));

        let ledger = f
            .payments
            .list(
                &f.customer,
                ListPaymentsQuery {
                    loan_id: Some(loan_id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ledger.total, 2);
        let collected: Decimal = ledger.data.iter().map(|p| p.amount_paid).sum();
        assert_eq!(collected, dec!(1100));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_double_disbursement_is_rejected() {
        let f = setup().await;
        let application_id = approved_application(&f, dec!(500), dec!(5), 2).await;

        f.loans
            .disburse(application_id, f.admin.user_id)
            .await
            .unwrap();
        let err = f
            .loans
            .disburse(application_id, f.admin.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));

        let loans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE application_id = $1")
                .bind(application_id)
                .fetch_one(&f.pool)
                .await
                .unwrap();
        assert_eq!(loans, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_overpayment_leaves_balance_untouched() {
        let f = setup().await;
        let application_id = approved_application(&f, dec!(500), dec!(0), 1).await;
        let loan = f
            .loans
            .disburse(application_id, f.admin.user_id)
            .await
            .unwrap()
            .loan;

        let err = f
            .payments
            .record_payment(
                RecordPaymentRequest {
                    loan_id: loan.id,
                    amount_paid: dec!(600),
                    payment_date: None,
                },
                f.admin.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Overpayment { requested, balance }
                if requested == dec!(600) && balance == dec!(500)
        ));

        let detail = f.loans.get(loan.id, &f.admin).await.unwrap();
        assert_eq!(detail.loan.balance, dec!(500));
        assert_eq!(detail.loan.status, LoanStatus::Active);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_payments_are_serialized() {
        let f = setup().await;
        let application_id = approved_application(&f, dec!(500), dec!(0), 1).await;
        let loan = f
            .loans
            .disburse(application_id, f.admin.user_id)
            .await
            .unwrap()
            .loan;

        let pay = |amount: Decimal| {
            f.payments.record_payment(
                RecordPaymentRequest {
                    loan_id: loan.id,
                    amount_paid: amount,
                    payment_date: None,
                },
                f.admin.user_id,
            )
        };

        let (first, second) = tokio::join!(pay(dec!(300)), pay(dec!(300)));
        let outcomes = [first, second];

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(ApiError::Overpayment { .. }))));

        let detail = f.loans.get(loan.id, &f.admin).await.unwrap();
        assert_eq!(detail.loan.balance, dec!(200));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_customers_only_see_their_own_records() {
        let f = setup().await;
        let application_id = approved_application(&f, dec!(800), dec!(10), 4).await;
        let loan = f
            .loans
            .disburse(application_id, f.admin.user_id)
            .await
            .unwrap()
            .loan;

        let auth = AuthService::new(f.pool.clone(), "lifecycle-secret".to_string(), 3600, 4);
        let other_id = new_customer(&auth, Some(f.admin.user_id)).await;
        let other = requester(other_id, UserRole::Customer);

        assert!(matches!(
            f.loans.get(loan.id, &other).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            f.applications.get(application_id, &other).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(f.loans.get(loan.id, &f.customer).await.is_ok());
        assert!(f.loans.get(loan.id, &f.admin).await.is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_unapproved_customer_cannot_apply() {
        let f = setup().await;
        let auth = AuthService::new(f.pool.clone(), "lifecycle-secret".to_string(), 3600, 4);
        let pending_id = new_customer(&auth, None).await;
        let pending = requester(pending_id, UserRole::Customer);

        let loan_type = f
            .loan_types
            .create(CreateLoanTypeRequest {
                name: "Starter".to_string(),
                interest_rate_type: InterestRateType::Monthly,
                interest_rate: dec!(2),
                term_months: 6,
            })
            .await
            .unwrap();

        let err = f
            .applications
            .submit(
                &pending,
                CreateApplicationRequest {
                    loan_type_id: loan_type.id,
                    amount: dec!(100),
                    purpose: String::new(),
                    user_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_rejected_application_is_terminal() {
        let f = setup().await;
        let loan_type = f
            .loan_types
            .create(CreateLoanTypeRequest {
                name: "Emergency".to_string(),
                interest_rate_type: InterestRateType::Flat,
                interest_rate: dec!(8),
                term_months: 3,
            })
            .await
            .unwrap();

        let application = f
            .applications
            .submit(
                &f.admin,
                CreateApplicationRequest {
                    loan_type_id: loan_type.id,
                    amount: dec!(250),
                    purpose: "Medical".to_string(),
                    user_id: Some(f.customer.user_id),
                },
            )
            .await
            .unwrap();
        assert_eq!(application.user_id, f.customer.user_id);

        f.applications
            .decline(application.id, f.admin.user_id)
            .await
            .unwrap();

        assert!(matches!(
            f.applications.approve(application.id, f.admin.user_id).await,
            Err(ApiError::InvalidState(_))
        ));
        assert!(matches!(
            f.loans.disburse(application.id, f.admin.user_id).await,
            Err(ApiError::InvalidState(_))
        ));
        assert!(matches!(
            f.applications
                .update(
                    application.id,
                    &f.customer,
                    UpdateApplicationRequest {
                        purpose: Some("Changed my mind".to_string()),
                        ..Default::default()
                    },
                )
                .await,
            Err(ApiError::InvalidState(_))
        ));
    }

    async fn pay(f: &Fixture, loan_id: i64, amount: Decimal) {
        f.payments
            .record_payment(
                RecordPaymentRequest {
                    loan_id,
                    amount_paid: amount,
                    payment_date: None,
                },
                f.admin.user_id,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_summary_tracks_lifecycle() {
        let f = setup().await;
        let summaries = SummaryService::new(f.pool.clone());
        let before = summaries.summary().await.unwrap();

        let loan_type = f
            .loan_types
            .create(CreateLoanTypeRequest {
                name: format!("Product {}", unique_digits(6)),
                interest_rate_type: InterestRateType::Flat,
                interest_rate: dec!(10),
                term_months: 5,
            })
            .await
            .unwrap();
        let application = f
            .applications
            .submit(
                &f.customer,
                CreateApplicationRequest {
                    loan_type_id: loan_type.id,
                    amount: dec!(1000),
                    purpose: "Market stall".to_string(),
                    user_id: None,
                },
            )
            .await
            .unwrap();

        let submitted = summaries.summary().await.unwrap();
        assert_eq!(
            submitted.pending_applications,
            before.pending_applications + 1
        );
        assert_eq!(submitted.total_loans, before.total_loans);

        f.applications
            .approve(application.id, f.admin.user_id)
            .await
            .unwrap();
        let loan = f
            .loans
            .disburse(application.id, f.admin.user_id)
            .await
            .unwrap()
            .loan;

        let disbursed = summaries.summary().await.unwrap();
        assert_eq!(
            disbursed.pending_applications,
            before.pending_applications
        );
        assert_eq!(disbursed.total_loans, before.total_loans + 1);
        assert_eq!(disbursed.active_loans, before.active_loans + 1);
        assert_eq!(disbursed.paid_loans, before.paid_loans);
        assert_eq!(disbursed.total_disbursed, before.total_disbursed + dec!(1000));
        assert_eq!(
            disbursed.total_outstanding,
            before.total_outstanding + dec!(1100)
        );
        assert_eq!(disbursed.total_collected, before.total_collected);

        pay(&f, loan.id, dec!(400)).await;
        let partly_paid = summaries.summary().await.unwrap();
        assert_eq!(
            partly_paid.total_outstanding,
            before.total_outstanding + dec!(700)
        );
        assert_eq!(
            partly_paid.total_collected,
            before.total_collected + dec!(400)
        );
        assert_eq!(partly_paid.paid_loans, before.paid_loans);

        pay(&f, loan.id, dec!(700)).await;
        let settled: Summary = summaries.summary().await.unwrap();
        assert_eq!(settled.total_loans, before.total_loans + 1);
        assert_eq!(settled.active_loans, before.active_loans);
        assert_eq!(settled.paid_loans, before.paid_loans + 1);
        assert_eq!(settled.total_outstanding, before.total_outstanding);
        assert_eq!(
            settled.total_collected,
            before.total_collected + dec!(1100)
        );
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_search_and_list_respect_ownership() {
        let f = setup().await;
        let application_id = approved_application(&f, dec!(600), dec!(5), 3).await;
        let loan = f
            .loans
            .disburse(application_id, f.admin.user_id)
            .await
            .unwrap()
            .loan;

        let auth = AuthService::new(f.pool.clone(), "lifecycle-secret".to_string(), 3600, 4);
        let other = requester(
            new_customer(&auth, Some(f.admin.user_id)).await,
            UserRole::Customer,
        );

        let username: String = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
            .bind(f.customer.user_id)
            .fetch_one(&f.pool)
            .await
            .unwrap();

        for term in [username, loan.id.to_string()] {
            let found = f.loans.search(&f.customer, &term).await.unwrap();
            assert!(found.iter().any(|l| l.id == loan.id), "owner searching {}", term);

            let found = f.loans.search(&f.admin, &term).await.unwrap();
            assert!(found.iter().any(|l| l.id == loan.id), "admin searching {}", term);

            let found = f.loans.search(&other, &term).await.unwrap();
            assert!(found.iter().all(|l| l.id != loan.id), "other searching {}", term);
        }

        let loans = f
            .loans
            .list(&other, ListLoansQuery::default())
            .await
            .unwrap();
        assert!(loans.data.iter().all(|l| l.id != loan.id));

        // Asking for someone else's applications still only returns your own
        let applications = f
            .applications
            .list(
                &other,
                ListApplicationsQuery {
                    user_id: Some(f.customer.user_id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(applications.total, 0);
        assert!(applications.data.is_empty());

        let applications = f
            .applications
            .list(&f.customer, ListApplicationsQuery::default())
            .await
            .unwrap();
        assert!(applications.data.iter().any(|a| a.id == application_id));
        assert!(applications
            .data
            .iter()
            .all(|a| a.user_id == f.customer.user_id));

        let applications = f
            .applications
            .list(
                &f.admin,
                ListApplicationsQuery {
                    user_id: Some(f.customer.user_id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(applications.data.iter().any(|a| a.id == application_id));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_health_reports_schema_version() {
        let f = setup().await;
        let health = check_health(&f.pool).await.unwrap();
        assert_eq!(health.schema_version, Some(20240101000000));
    }
}
