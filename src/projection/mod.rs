//! Projection engine for build-to-rent portfolio cash flows

mod acquisition;
mod cashflows;
mod engine;
mod state;
pub mod debt;
pub mod irr;

pub use acquisition::AcquisitionSummary;
pub use cashflows::{
    AnnualCashflow, ExitSummary, OperatingExpenses, ProjectionResult, ProjectionSummary, Returns, ValuationPoint,
};
pub use debt::{remaining_loan_balance, DEFAULT_LOAN_TERM_YEARS};
pub use engine::{project, ProjectionEngine};
pub use irr::{calculate_irr, solve_irr, IrrSolution, IrrStatus};
pub use state::PreferredReturnState;
