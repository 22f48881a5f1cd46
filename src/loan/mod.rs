//! Loans, disbursement and repayment schedules

mod model;
mod schedule;
mod service;

pub use model::*;
pub use schedule::{
    build_plan, interest_portions, round_money, split_evenly, total_interest, Installment,
    LoanPlan, ScheduleError,
};
pub use service::LoanService;
