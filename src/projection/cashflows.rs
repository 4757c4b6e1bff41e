//! Output structures for a projection run
//!
//! Serialized field names are the ones the presentation and report layers
//! bind to (`cashFlowAfterDebtService`, `totalToLPs`, ...). Money in dollars,
//! rates fractional, `cashYield` and `averageAnnualCashYield` in percent.

use serde::{Deserialize, Serialize};

use super::acquisition::AcquisitionSummary;
use super::irr::IrrStatus;
use crate::assumptions::ExitStrategy;

/// Itemized annual operating expenses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingExpenses {
    pub property_management: f64,
    pub maintenance: f64,
    pub property_taxes: f64,
    pub insurance: f64,
    pub hoa_fees: f64,
    pub other: f64,
}

impl OperatingExpenses {
    pub fn total(&self) -> f64 {
        self.property_management + self.maintenance + self.property_taxes + self.insurance + self.hoa_fees + self.other
    }
}

/// One year of the cash flow waterfall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualCashflow {
    /// 1-indexed hold year
    pub year: u32,

    // Income
    pub potential_rental_income: f64,
    /// Effective (post-vacancy) rental income
    pub rental_income: f64,
    /// Portfolio value used as the property tax base
    pub property_value: f64,

    // Operations
    pub operating_expenses: f64,
    pub expense_detail: OperatingExpenses,
    pub noi: f64,
    pub debt_service: f64,
    pub cash_flow_after_debt_service: f64,

    // Waterfall
    pub preferred_return_paid: f64,
    /// Accrued preferred return carried into next year
    pub unpaid_preferred_return: f64,
    pub lp_distribution: f64,
    pub gp_distribution: f64,

    // Ratios
    /// NOI / debt service; `None` when there is no debt service
    pub dscr: Option<f64>,
    /// LP distribution / required equity, in percent
    pub cash_yield: f64,
}

impl AnnualCashflow {
    /// Cash left after the preferred return, floored at zero
    pub fn remaining_cash_flow(&self) -> f64 {
        (self.cash_flow_after_debt_service - self.preferred_return_paid).max(0.0)
    }
}

/// Portfolio value, cost, debt and LP equity at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationPoint {
    /// Label, "Year 0" for acquisition
    pub year: String,
    pub year_index: u32,
    pub portfolio_value: f64,
    pub portfolio_cost: f64,
    pub portfolio_debt: f64,
    pub lp_equity: f64,
    /// Same as `portfolio_value`; kept for chart bindings
    pub value: f64,
}

impl ValuationPoint {
    pub fn new(year_index: u32, portfolio_value: f64, portfolio_cost: f64, portfolio_debt: f64) -> Self {
        Self {
            year: format!("Year {}", year_index),
            year_index,
            portfolio_value,
            portfolio_cost,
            portfolio_debt,
            lp_equity: portfolio_value - portfolio_debt,
            value: portfolio_value,
        }
    }
}

/// Sale proceeds and how they are distributed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitSummary {
    pub exit_strategy: ExitStrategy,
    pub gross_sale_proceeds: f64,
    pub selling_costs: f64,
    pub net_sale_proceeds: f64,
    pub remaining_loan_balance: f64,
    pub net_proceeds_after_debt: f64,
    pub return_of_capital: f64,
    /// Preferred return paid during the hold plus any still accrued
    pub preferred_return_at_exit: f64,
    pub lp_profit: f64,
    pub gp_profit: f64,
    #[serde(rename = "totalToLPs")]
    pub total_to_lps: f64,
}

/// Investor return metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Returns {
    /// Annual LP IRR, fractional
    pub irr: f64,
    pub irr_status: IrrStatus,
    pub equity_multiple: f64,
    #[serde(rename = "totalCashToLPs")]
    pub total_cash_to_lps: f64,
    /// Mean of annual cash yields, in percent
    pub average_annual_cash_yield: f64,
}

/// Complete projection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub acquisition_summary: AcquisitionSummary,

    /// Annual records, years 1..=hold period
    pub cash_flows: Vec<AnnualCashflow>,

    pub exit_summary: ExitSummary,

    pub returns: Returns,

    /// Valuation points, years 0..=hold period
    pub portfolio_value_chart_data: Vec<ValuationPoint>,

    /// LP cash flow sequence fed to the IRR solver
    pub lp_cash_flows: Vec<f64>,
}

impl ProjectionResult {
    pub fn first_year(&self) -> Option<&AnnualCashflow> {
        self.cash_flows.first()
    }

    pub fn final_year(&self) -> Option<&AnnualCashflow> {
        self.cash_flows.last()
    }

    /// Preferred return actually paid out over the hold
    pub fn accumulated_preferred_return(&self) -> f64 {
        self.cash_flows.iter().map(|r| r.preferred_return_paid).sum()
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        ProjectionSummary {
            hold_years: self.cash_flows.len() as u32,
            total_rental_income: self.cash_flows.iter().map(|r| r.rental_income).sum(),
            total_noi: self.cash_flows.iter().map(|r| r.noi).sum(),
            total_lp_distributions: self.cash_flows.iter().map(|r| r.lp_distribution).sum(),
            total_gp_distributions: self.cash_flows.iter().map(|r| r.gp_distribution).sum(),
            min_dscr: self
                .cash_flows
                .iter()
                .filter_map(|r| r.dscr)
                .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.min(d)))),
            unpaid_preferred_at_exit: self.final_year().map(|r| r.unpaid_preferred_return).unwrap_or(0.0),
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub hold_years: u32,
    pub total_rental_income: f64,
    pub total_noi: f64,
    pub total_lp_distributions: f64,
    pub total_gp_distributions: f64,
    pub min_dscr: Option<f64>,
    pub unpaid_preferred_at_exit: f64,
}
