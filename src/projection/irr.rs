//! Internal Rate of Return (IRR) calculation
//!
//! Bisection on NPV for an outflow-then-inflows cash flow profile. NPV is
//! monotonically decreasing in the rate for that shape, so a positive NPV
//! means the rate is too low. Sequences with several sign changes are not
//! handled specially.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Lower bisection bound (-99.9% per period)
pub const LOWER_BOUND: f64 = -0.999;
/// Upper bisection bound (200% per period)
pub const UPPER_BOUND: f64 = 2.0;
/// Starting midpoint when the rough guess falls outside the bounds
pub const FALLBACK_GUESS: f64 = 0.1;
pub const MAX_ITERATIONS: u32 = 50;
/// Absolute NPV considered zero
pub const NPV_PRECISION: f64 = 0.0001;

/// How the solver arrived at its rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IrrStatus {
    /// NPV reached the precision band
    Converged,
    /// First cash flow is not an outflow; rate reported as 0
    NoInvestment,
    /// Nothing positive after the initial outflow; rate reported as -1
    TotalLoss,
    /// Iteration budget exhausted; rate is the last midpoint
    IterationLimit,
}

/// Solver output: the rate plus how much to trust it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrSolution {
    pub rate: f64,
    pub status: IrrStatus,
    pub iterations: u32,
    /// NPV at the reported rate
    pub npv: f64,
}

impl IrrSolution {
    fn sentinel(rate: f64, status: IrrStatus) -> Self {
        Self {
            rate,
            status,
            iterations: 0,
            npv: 0.0,
        }
    }

    /// False only when the iteration budget ran out
    pub fn converged(&self) -> bool {
        self.status != IrrStatus::IterationLimit
    }

    /// The rate, or `NonConvergent` if bisection never met the precision band
    pub fn require_converged(&self) -> Result<f64> {
        if self.converged() {
            Ok(self.rate)
        } else {
            Err(ModelError::NonConvergent {
                iterations: self.iterations,
                npv: self.npv,
            })
        }
    }
}

/// NPV of `cashflows` at periodic `rate`, index 0 undiscounted
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Solve for the periodic IRR of a signed cash flow sequence.
///
/// * first flow >= 0 (or empty input): rate 0, `NoInvestment`
/// * no positive flow after index 0: rate -1, `TotalLoss`
/// * otherwise bisection on `[-0.999, 2.0]`, at most 50 iterations
pub fn solve_irr(cashflows: &[f64]) -> IrrSolution {
    let initial = match cashflows.first() {
        Some(&cf) if cf < 0.0 => cf,
        _ => return IrrSolution::sentinel(0.0, IrrStatus::NoInvestment),
    };

    if !cashflows[1..].iter().any(|&cf| cf > 0.0) {
        return IrrSolution::sentinel(-1.0, IrrStatus::TotalLoss);
    }

    let mut low = LOWER_BOUND;
    let mut high = UPPER_BOUND;

    let total: f64 = cashflows.iter().sum();
    let years = (cashflows.len() - 1) as f64;
    let rough_guess = (total / initial).abs().powf(1.0 / years) - 1.0;

    // NaN fails both comparisons and falls back
    let mut mid = if rough_guess > low && rough_guess < high {
        rough_guess
    } else {
        FALLBACK_GUESS
    };

    let mut npv = 0.0;
    for iteration in 1..=MAX_ITERATIONS {
        npv = npv_at_rate(cashflows, mid);

        if npv.abs() < NPV_PRECISION {
            return IrrSolution {
                rate: mid,
                status: IrrStatus::Converged,
                iterations: iteration,
                npv,
            };
        }

        if npv > 0.0 {
            low = mid;
        } else {
            high = mid;
        }

        mid = (low + high) / 2.0;
    }

    IrrSolution {
        rate: mid,
        status: IrrStatus::IterationLimit,
        iterations: MAX_ITERATIONS,
        npv,
    }
}

/// Periodic IRR as a plain number, sentinels included
pub fn calculate_irr(cashflows: &[f64]) -> f64 {
    solve_irr(cashflows).rate
}
