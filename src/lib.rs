//! BTR Model - Projection engine for build-to-rent housing portfolios
//!
//! This library provides:
//! - Acquisition sizing (cost, loan, equity, interest-only debt service)
//! - Annual cash flow projection with an LP preferred return waterfall
//! - Portfolio and individual-home exit proceeds and distribution
//! - Investor returns (IRR, equity multiple, cash yield)
//! - Batch scenarios and exit cap rate sensitivity
//! - Printable report data and CSV export

pub mod assumptions;
pub mod error;
pub mod projection;
pub mod report;
pub mod scenario;

// Re-export commonly used types
pub use assumptions::{Assumptions, ExitStrategy};
pub use error::{ModelError, Result};
pub use projection::{project, AnnualCashflow, ProjectionEngine, ProjectionResult};
pub use report::ReportData;
pub use scenario::ScenarioRunner;
