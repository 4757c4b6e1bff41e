//! Core projection engine for annual portfolio cash flow projections

use log::{debug, info};

use super::acquisition::AcquisitionSummary;
use super::cashflows::{AnnualCashflow, ExitSummary, OperatingExpenses, ProjectionResult, Returns, ValuationPoint};
use super::irr::solve_irr;
use super::state::PreferredReturnState;
use crate::assumptions::{Assumptions, ExitStrategy};
use crate::error::Result;

/// Main projection engine
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    assumptions: Assumptions,
}

impl ProjectionEngine {
    /// Create a new projection engine for the given assumptions
    pub fn new(assumptions: Assumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Run the full projection: acquisition, annual waterfall, valuation,
    /// exit and returns. Fails only if the assumptions are invalid.
    pub fn project(&self) -> Result<ProjectionResult> {
        self.assumptions.validate()?;

        let acquisition = AcquisitionSummary::from_assumptions(&self.assumptions);
        let mut state = PreferredReturnState::new();

        let cash_flows: Vec<AnnualCashflow> = (1..=self.assumptions.exit.hold_period_years)
            .map(|year| self.project_year(year, &acquisition, &mut state))
            .collect();

        let portfolio_value_chart_data = self.valuation_series(&acquisition);
        let exit_summary = self.exit_waterfall(&acquisition, &cash_flows, &state);
        let lp_cash_flows = lp_cash_flow_sequence(&acquisition, &cash_flows, &exit_summary, state.accumulated);
        let returns = self.returns(&acquisition, &cash_flows, &exit_summary, &lp_cash_flows);

        info!(
            "projected {} years, {} exit: IRR {:.2}%, equity multiple {:.2}x",
            cash_flows.len(),
            exit_summary.exit_strategy,
            returns.irr * 100.0,
            returns.equity_multiple
        );

        Ok(ProjectionResult {
            acquisition_summary: acquisition,
            cash_flows,
            exit_summary,
            returns,
            portfolio_value_chart_data,
            lp_cash_flows,
        })
    }

    /// Calculate one hold year and advance the preferred return state
    fn project_year(
        &self,
        year: u32,
        acquisition: &AcquisitionSummary,
        state: &mut PreferredReturnState,
    ) -> AnnualCashflow {
        let a = &self.assumptions;

        let potential_rental_income = a.potential_rent(year);
        let rental_income = potential_rental_income * (1.0 - a.operating.vacancy_rate);

        // Tax base uses start-of-year value; the valuation series uses end-of-year
        let property_value = a.market_value_after(year - 1);

        let expense_detail = self.operating_expenses(rental_income, property_value);
        let operating_expenses = expense_detail.total();
        let noi = rental_income - operating_expenses;

        // Interest-only for the whole hold
        let debt_service = acquisition.annual_interest_only_payment;
        let cash_flow_after_debt_service = noi - debt_service;

        let annual_preferred = acquisition.equity_required * a.capital.preferred_return;
        let preferred_return_paid = state.settle(cash_flow_after_debt_service, annual_preferred);

        let remaining = (cash_flow_after_debt_service - preferred_return_paid).max(0.0);
        let lp_distribution = preferred_return_paid + remaining * a.capital.lp_split;
        let gp_distribution = remaining * a.capital.gp_split;

        let dscr = if debt_service != 0.0 {
            Some(noi / debt_service).filter(|d| d.is_finite())
        } else {
            None
        };
        let cash_yield = finite_or_zero(lp_distribution / acquisition.equity_required * 100.0);

        debug!(
            "year {}: income {:.2} opex {:.2} NOI {:.2} pref paid {:.2} unpaid {:.2} LP {:.2} GP {:.2}",
            year, rental_income, operating_expenses, noi, preferred_return_paid, state.unpaid, lp_distribution, gp_distribution
        );

        AnnualCashflow {
            year,
            potential_rental_income,
            rental_income,
            property_value,
            operating_expenses,
            expense_detail,
            noi,
            debt_service,
            cash_flow_after_debt_service,
            preferred_return_paid,
            unpaid_preferred_return: state.unpaid,
            lp_distribution,
            gp_distribution,
            dscr,
            cash_yield,
        }
    }

    /// Itemized operating expenses for one year
    fn operating_expenses(&self, rental_income: f64, property_value: f64) -> OperatingExpenses {
        let op = &self.assumptions.operating;
        let homes = self.assumptions.portfolio.total_homes as f64;

        OperatingExpenses {
            property_management: rental_income * op.property_management_fee,
            maintenance: rental_income * op.maintenance_cost,
            property_taxes: property_value * op.property_tax_rate,
            insurance: homes * op.insurance_cost_per_home,
            hoa_fees: homes * op.hoa_fees_per_home,
            other: homes * op.other_expenses_per_home,
        }
    }

    /// Valuation points for years 0..=hold period.
    ///
    /// Debt stays at the original loan amount at every point.
    fn valuation_series(&self, acquisition: &AcquisitionSummary) -> Vec<ValuationPoint> {
        (0..=self.assumptions.exit.hold_period_years)
            .map(|year| {
                ValuationPoint::new(
                    year,
                    self.assumptions.market_value_after(year),
                    acquisition.total_acquisition_cost,
                    acquisition.loan_amount,
                )
            })
            .collect()
    }

    /// Gross proceeds for the configured exit strategy
    pub fn gross_sale_proceeds(&self, final_year_noi: f64) -> f64 {
        let exit = &self.assumptions.exit;
        match exit.exit_strategy {
            ExitStrategy::Portfolio => final_year_noi / exit.portfolio_exit_cap_rate,
            ExitStrategy::Individual => {
                self.assumptions.market_value_after(exit.hold_period_years) * (1.0 + exit.individual_sales_premium)
            }
        }
    }

    /// Sale proceeds and their distribution between return of capital,
    /// preferred return and the LP/GP profit split
    fn exit_waterfall(
        &self,
        acquisition: &AcquisitionSummary,
        cash_flows: &[AnnualCashflow],
        state: &PreferredReturnState,
    ) -> ExitSummary {
        let a = &self.assumptions;
        let final_year_noi = cash_flows.last().map(|r| r.noi).unwrap_or(0.0);

        let gross_sale_proceeds = self.gross_sale_proceeds(final_year_noi);
        let selling_costs = gross_sale_proceeds * a.exit.brokerage_fee;
        let net_sale_proceeds = gross_sale_proceeds - selling_costs;

        // No amortization: the full original loan is repaid at exit
        let remaining_loan_balance = acquisition.loan_amount;
        let net_proceeds_after_debt = net_sale_proceeds - remaining_loan_balance;

        let return_of_capital = acquisition.equity_required;
        let preferred_return_at_exit = state.accumulated + state.unpaid;

        // Preferred return already paid during the hold is not deducted again
        let residual = net_proceeds_after_debt - return_of_capital - state.unpaid;
        let (lp_profit, gp_profit) = if residual > 0.0 {
            (residual * a.capital.lp_split, residual * a.capital.gp_split)
        } else {
            (0.0, 0.0)
        };

        ExitSummary {
            exit_strategy: a.exit.exit_strategy,
            gross_sale_proceeds,
            selling_costs,
            net_sale_proceeds,
            remaining_loan_balance,
            net_proceeds_after_debt,
            return_of_capital,
            preferred_return_at_exit,
            lp_profit,
            gp_profit,
            total_to_lps: return_of_capital + preferred_return_at_exit + lp_profit,
        }
    }

    fn returns(
        &self,
        acquisition: &AcquisitionSummary,
        cash_flows: &[AnnualCashflow],
        exit: &ExitSummary,
        lp_cash_flows: &[f64],
    ) -> Returns {
        let solution = solve_irr(lp_cash_flows);
        let hold_years = self.assumptions.exit.hold_period_years as f64;

        Returns {
            irr: finite_or_zero(solution.rate),
            irr_status: solution.status,
            equity_multiple: finite_or_zero(exit.total_to_lps / acquisition.equity_required),
            total_cash_to_lps: exit.total_to_lps,
            average_annual_cash_yield: finite_or_zero(
                cash_flows.iter().map(|r| r.cash_yield).sum::<f64>() / hold_years,
            ),
        }
    }
}

/// LP cash flows for the IRR: equity out at year 0, annual LP distributions,
/// and the exit distribution (net of preferred already paid) folded into the
/// final year.
fn lp_cash_flow_sequence(
    acquisition: &AcquisitionSummary,
    cash_flows: &[AnnualCashflow],
    exit: &ExitSummary,
    accumulated_preferred: f64,
) -> Vec<f64> {
    let mut sequence = Vec::with_capacity(cash_flows.len() + 1);
    sequence.push(-acquisition.equity_required);
    sequence.extend(cash_flows.iter().map(|r| r.lp_distribution));

    if let Some(last) = sequence.last_mut() {
        *last += exit.total_to_lps - accumulated_preferred;
    }
    sequence
}

/// Replace NaN/Infinity with zero before handing values outward
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Validate and project an assumption set
pub fn project(assumptions: &Assumptions) -> Result<ProjectionResult> {
    ProjectionEngine::new(assumptions.clone()).project()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::projection::irr::IrrStatus;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn base_result() -> ProjectionResult {
        project(&Assumptions::default()).expect("base case should project")
    }

    #[test]
    fn test_projection_runs() {
        let result = base_result();

        assert_eq!(result.cash_flows.len(), 7);
        assert_eq!(result.portfolio_value_chart_data.len(), 8);
        assert_eq!(result.lp_cash_flows.len(), 8);
        assert_eq!(result.cash_flows[0].year, 1);
        assert_eq!(result.cash_flows[6].year, 7);
    }

    #[test]
    fn test_base_case_year_one() {
        let result = base_result();
        let y1 = &result.cash_flows[0];

        assert_abs_diff_eq!(y1.potential_rental_income, 13_500_000.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.rental_income, 12_825_000.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.property_value, 167_500_000.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.expense_detail.property_management, 1_026_000.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.expense_detail.maintenance, 641_250.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.expense_detail.property_taxes, 1_675_000.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.expense_detail.insurance, 600_000.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.operating_expenses, 3_942_250.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.noi, 8_882_750.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.debt_service, 4_551_483.75, epsilon = 1e-4);

        // Cash after debt service (4,331,266.25) falls short of the 4,413,560 preferred return
        assert_abs_diff_eq!(y1.cash_flow_after_debt_service, 4_331_266.25, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.preferred_return_paid, 4_331_266.25, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.unpaid_preferred_return, 82_293.75, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.lp_distribution, 4_331_266.25, epsilon = 1e-4);
        assert_eq!(y1.gp_distribution, 0.0);

        let dscr = y1.dscr.expect("debt service is non-zero");
        assert_relative_eq!(dscr, 8_882_750.0 / 4_551_483.75, max_relative = 1e-12);
        assert!(dscr > 0.0);
        assert_relative_eq!(y1.cash_yield, 4_331_266.25 / 55_169_500.0 * 100.0, max_relative = 1e-12);
        assert!(y1.cash_yield > 0.0);
    }

    #[test]
    fn test_base_case_year_two_catches_up() {
        let result = base_result();
        let y2 = &result.cash_flows[1];

        assert_abs_diff_eq!(y2.noi, 9_167_232.5, epsilon = 1e-4);
        assert_abs_diff_eq!(y2.preferred_return_paid, 4_413_560.0 + 82_293.75, epsilon = 1e-4);
        assert_eq!(y2.unpaid_preferred_return, 0.0);
        assert_abs_diff_eq!(y2.gp_distribution, y2.remaining_cash_flow() * 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_cash_flow_identities_hold_every_year() {
        for strategy in [ExitStrategy::Portfolio, ExitStrategy::Individual] {
            let mut a = Assumptions::default().with_exit_strategy(strategy).with_hold_period(12);
            a.operating.vacancy_rate = 0.12;

            let result = project(&a).unwrap();
            let annual_preferred = result.acquisition_summary.equity_required * a.capital.preferred_return;

            let mut prior_unpaid = 0.0;
            for row in &result.cash_flows {
                assert_abs_diff_eq!(row.cash_flow_after_debt_service, row.noi - row.debt_service, epsilon = 1e-6);
                assert_abs_diff_eq!(
                    row.lp_distribution + row.gp_distribution,
                    row.preferred_return_paid + row.remaining_cash_flow(),
                    epsilon = 1e-6
                );
                assert!(row.unpaid_preferred_return >= 0.0);
                assert_abs_diff_eq!(
                    row.unpaid_preferred_return,
                    (prior_unpaid + annual_preferred - row.preferred_return_paid).max(0.0),
                    epsilon = 1e-6
                );
                prior_unpaid = row.unpaid_preferred_return;
            }
        }
    }

    #[test]
    fn test_unpaid_grows_by_shortfall_when_nothing_is_carried() {
        // Heavy vacancy: cash never covers the preferred return
        let mut a = Assumptions::default();
        a.operating.vacancy_rate = 0.35;

        let result = project(&a).unwrap();
        let annual_preferred = result.acquisition_summary.equity_required * a.capital.preferred_return;

        let mut prior_unpaid = 0.0;
        for row in &result.cash_flows {
            assert!(row.preferred_return_paid < annual_preferred);
            assert_abs_diff_eq!(
                row.unpaid_preferred_return - prior_unpaid,
                (annual_preferred - row.preferred_return_paid).max(0.0),
                epsilon = 1e-6
            );
            assert_eq!(row.gp_distribution, 0.0);
            prior_unpaid = row.unpaid_preferred_return;
        }
    }

    #[test]
    fn test_negative_cash_flow_reaches_lps() {
        // Debt service exceeds NOI every year
        let mut a = Assumptions::default();
        a.operating.vacancy_rate = 0.6;

        let result = project(&a).unwrap();
        let y1 = &result.cash_flows[0];

        assert_abs_diff_eq!(y1.noi, 2_423_000.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y1.cash_flow_after_debt_service, -2_128_483.75, epsilon = 1e-4);
        assert_eq!(y1.preferred_return_paid, y1.cash_flow_after_debt_service);
        assert_eq!(y1.lp_distribution, y1.cash_flow_after_debt_service);
        assert_eq!(y1.gp_distribution, 0.0);
        assert_abs_diff_eq!(y1.unpaid_preferred_return, 4_413_560.0 + 2_128_483.75, epsilon = 1e-4);
        assert!(y1.cash_yield < 0.0);

        for (i, row) in result.cash_flows.iter().enumerate().take(6) {
            assert!(row.cash_flow_after_debt_service < 0.0);
            assert_eq!(result.lp_cash_flows[i + 1], row.cash_flow_after_debt_service);
        }

        let exit = &result.exit_summary;
        let accumulated = result.accumulated_preferred_return();
        assert!(accumulated < 0.0);
        // Nothing was ever fully paid, so paid plus carried is the full seven years
        assert_abs_diff_eq!(exit.preferred_return_at_exit, 7.0 * 4_413_560.0, epsilon = 1e-3);
        assert_eq!(exit.lp_profit, 0.0);
        assert_abs_diff_eq!(
            exit.total_to_lps,
            exit.return_of_capital + exit.preferred_return_at_exit,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            result.lp_cash_flows[7],
            result.cash_flows[6].lp_distribution + exit.total_to_lps - accumulated,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            result.returns.equity_multiple,
            exit.total_to_lps / 55_169_500.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_valuation_series_uses_end_of_year_value() {
        let result = base_result();
        let points = &result.portfolio_value_chart_data;

        assert_eq!(points[0].year, "Year 0");
        assert_abs_diff_eq!(points[0].portfolio_value, 167_500_000.0, epsilon = 1e-4);
        assert_abs_diff_eq!(points[0].lp_equity, 167_500_000.0 - 82_754_250.0, epsilon = 1e-4);

        for (i, point) in points.iter().enumerate().skip(1) {
            assert_eq!(point.year_index, i as u32);
            assert_eq!(point.portfolio_debt, result.acquisition_summary.loan_amount);
            assert_eq!(point.portfolio_cost, result.acquisition_summary.total_acquisition_cost);
            // Valuation point for year y sits one year of appreciation above the year-y tax base
            assert_relative_eq!(point.portfolio_value, result.cash_flows[i - 1].property_value * 1.03, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_portfolio_exit_waterfall() {
        let result = base_result();
        let exit = &result.exit_summary;
        let final_noi = result.final_year().unwrap().noi;

        assert_eq!(exit.exit_strategy, ExitStrategy::Portfolio);
        assert_relative_eq!(exit.gross_sale_proceeds, final_noi / 0.055, max_relative = 1e-12);
        assert_relative_eq!(exit.selling_costs, exit.gross_sale_proceeds * 0.05, max_relative = 1e-12);
        assert_eq!(exit.remaining_loan_balance, result.acquisition_summary.loan_amount);
        assert_abs_diff_eq!(exit.return_of_capital, 55_169_500.0, epsilon = 1e-4);

        let unpaid = result.final_year().unwrap().unpaid_preferred_return;
        let residual = exit.net_proceeds_after_debt - exit.return_of_capital - unpaid;
        assert!(residual > 0.0);
        assert_relative_eq!(exit.lp_profit, residual * 0.8, max_relative = 1e-12);
        assert_relative_eq!(exit.gp_profit, residual * 0.2, max_relative = 1e-12);
        assert_abs_diff_eq!(
            exit.preferred_return_at_exit,
            result.accumulated_preferred_return() + unpaid,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            exit.total_to_lps,
            exit.return_of_capital + exit.preferred_return_at_exit + exit.lp_profit,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_individual_exit_uses_appreciated_value() {
        let a = Assumptions::default().with_exit_strategy(ExitStrategy::Individual);
        let result = project(&a).unwrap();

        let expected = 167_500_000.0 * 1.03_f64.powi(7) * 1.05;
        assert_relative_eq!(result.exit_summary.gross_sale_proceeds, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_underwater_exit_has_no_profit_split() {
        let mut a = Assumptions::default();
        a.exit.portfolio_exit_cap_rate = 0.5;

        let result = project(&a).unwrap();
        assert!(result.exit_summary.net_proceeds_after_debt < result.exit_summary.return_of_capital);
        assert_eq!(result.exit_summary.lp_profit, 0.0);
        assert_eq!(result.exit_summary.gp_profit, 0.0);
    }

    #[test]
    fn test_higher_cap_rate_lowers_gross_proceeds() {
        let mut last = f64::INFINITY;
        for cap_rate in [0.04, 0.045, 0.05, 0.055, 0.06, 0.07] {
            let result = project(&Assumptions::default().with_exit_cap_rate(cap_rate)).unwrap();
            assert!(result.exit_summary.gross_sale_proceeds < last);
            last = result.exit_summary.gross_sale_proceeds;
        }
    }

    #[test]
    fn test_returns_assembly() {
        let result = base_result();
        let returns = &result.returns;
        let exit = &result.exit_summary;

        assert_eq!(result.lp_cash_flows[0], -result.acquisition_summary.equity_required);
        for (i, row) in result.cash_flows.iter().take(6).enumerate() {
            assert_eq!(result.lp_cash_flows[i + 1], row.lp_distribution);
        }
        assert_abs_diff_eq!(
            result.lp_cash_flows[7],
            result.cash_flows[6].lp_distribution + exit.total_to_lps - result.accumulated_preferred_return(),
            epsilon = 1e-6
        );

        assert_eq!(returns.irr_status, IrrStatus::Converged);
        assert!(returns.irr > 0.0 && returns.irr < 1.0);
        assert_relative_eq!(returns.equity_multiple, exit.total_to_lps / 55_169_500.0, max_relative = 1e-9);
        assert_eq!(returns.total_cash_to_lps, exit.total_to_lps);

        let mean_yield = result.cash_flows.iter().map(|r| r.cash_yield).sum::<f64>() / 7.0;
        assert_relative_eq!(returns.average_annual_cash_yield, mean_yield, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_debt_service_has_no_dscr() {
        let mut a = Assumptions::default();
        a.capital.loan_to_value = 0.0;

        let result = project(&a).unwrap();
        for row in &result.cash_flows {
            assert_eq!(row.debt_service, 0.0);
            assert_eq!(row.dscr, None);
            assert!(row.cash_yield.is_finite());
        }
        assert!(result.returns.irr.is_finite());
        assert!(result.summary().min_dscr.is_none());
    }

    #[test]
    fn test_single_year_hold() {
        let result = project(&Assumptions::default().with_hold_period(1)).unwrap();
        assert_eq!(result.cash_flows.len(), 1);
        assert_eq!(result.portfolio_value_chart_data.len(), 2);
        assert_eq!(result.lp_cash_flows.len(), 2);
    }

    #[test]
    fn test_invalid_assumptions_rejected() {
        let mut a = Assumptions::default();
        a.capital.lp_split = 0.9;

        let err = ProjectionEngine::new(a).project().unwrap_err();
        assert!(matches!(err, ModelError::InvalidAssumptions { .. }));
    }

    #[test]
    fn test_rerun_is_identical() {
        let a = Assumptions::default();
        let engine = ProjectionEngine::new(a.clone());

        let first = engine.project().unwrap();
        let second = engine.project().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.returns.irr.to_bits(), second.returns.irr.to_bits());
        assert_eq!(engine.assumptions(), &a);
    }
}
