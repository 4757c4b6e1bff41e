//! Scenario runner for batch projections
//!
//! Holds one base assumption set and projects variations of it. Each run is
//! independent, so batches are projected in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assumptions::{Assumptions, ExitStrategy};
use crate::error::Result;
use crate::projection::{project, ProjectionResult};

/// One point of an exit cap rate sensitivity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityPoint {
    pub cap_rate: f64,
    pub gross_sale_proceeds: f64,
    pub irr: f64,
    pub equity_multiple: f64,
}

/// The same assumptions projected under both exit strategies
#[derive(Debug, Clone, PartialEq)]
pub struct ExitComparison {
    pub portfolio: ProjectionResult,
    pub individual: ProjectionResult,
}

impl ExitComparison {
    pub fn get(&self, strategy: ExitStrategy) -> &ProjectionResult {
        match strategy {
            ExitStrategy::Portfolio => &self.portfolio,
            ExitStrategy::Individual => &self.individual,
        }
    }

    /// Strategy with the higher LP IRR; portfolio on a tie
    pub fn preferred(&self) -> ExitStrategy {
        if self.individual.returns.irr > self.portfolio.returns.irr {
            ExitStrategy::Individual
        } else {
            ExitStrategy::Portfolio
        }
    }
}

/// Runner for projections derived from one base case
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(Assumptions::default());
/// let points = runner.sweep_exit_cap_rates(&[0.05, 0.055, 0.06])?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    base_assumptions: Assumptions,
}

impl ScenarioRunner {
    pub fn new(base_assumptions: Assumptions) -> Self {
        Self { base_assumptions }
    }

    /// Project the base case
    pub fn run(&self) -> Result<ProjectionResult> {
        project(&self.base_assumptions)
    }

    /// Project several assumption sets, results in input order
    pub fn run_scenarios(&self, scenarios: &[Assumptions]) -> Result<Vec<ProjectionResult>> {
        scenarios.par_iter().map(project).collect()
    }

    /// Portfolio-exit sensitivity to the exit cap rate
    pub fn sweep_exit_cap_rates(&self, cap_rates: &[f64]) -> Result<Vec<SensitivityPoint>> {
        let portfolio = self.base_assumptions.with_exit_strategy(ExitStrategy::Portfolio);
        let scenarios: Vec<Assumptions> = cap_rates.iter().map(|&rate| portfolio.with_exit_cap_rate(rate)).collect();

        let results = self.run_scenarios(&scenarios)?;
        Ok(cap_rates
            .iter()
            .zip(results)
            .map(|(&cap_rate, result)| SensitivityPoint {
                cap_rate,
                gross_sale_proceeds: result.exit_summary.gross_sale_proceeds,
                irr: result.returns.irr,
                equity_multiple: result.returns.equity_multiple,
            })
            .collect())
    }

    /// Project the base case under both exit strategies
    pub fn compare_exit_strategies(&self) -> Result<ExitComparison> {
        let (portfolio, individual) = rayon::join(
            || project(&self.base_assumptions.with_exit_strategy(ExitStrategy::Portfolio)),
            || project(&self.base_assumptions.with_exit_strategy(ExitStrategy::Individual)),
        );

        Ok(ExitComparison {
            portfolio: portfolio?,
            individual: individual?,
        })
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.base_assumptions
    }
}
