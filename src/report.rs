//! Report data for the printable investment summary
//!
//! Reshapes a projection into the aliased fields the report template binds
//! to (`grossIncome`, `netOperatingIncome`, `cashFlowYield`, ...) and
//! exports annual records as CSV.

use std::io::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assumptions::{Assumptions, ExitStrategy};
use crate::error::Result;
use crate::projection::{AnnualCashflow, ProjectionResult, DEFAULT_LOAN_TERM_YEARS};
use crate::scenario::ExitComparison;

/// Land share of the 3-bed acquisition price
pub const LAND_COST_SHARE: f64 = 0.2;
/// Construction share of the 3-bed acquisition price
pub const CONSTRUCTION_COST_SHARE: f64 = 0.8;
pub const OTHER_COSTS_PER_HOME: f64 = 5_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    pub investment_type: String,
    pub total_homes: u32,
    pub three_bed_homes: u32,
    pub four_bed_homes: u32,
    pub investment_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    /// Required equity
    pub total_investment: f64,
    pub irr: f64,
    /// Average annual cash yield as a fraction
    pub cash_on_cash_return: f64,
    /// Year-1 NOI over the acquisition-date portfolio value
    pub cap_rate: f64,
    pub equity_multiple: f64,
    /// First hold year in which cumulative LP cash returns the equity
    pub payback_period: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub land_cost_per_home: f64,
    pub construction_cost_per_home: f64,
    pub other_costs_per_home: f64,
    pub total_acquisition_costs: f64,
    pub total_financing_costs: f64,
    pub total_project_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financing {
    pub ltc: f64,
    pub loan_amount: f64,
    pub equity_amount: f64,
    pub interest_rate: f64,
    pub loan_term: u32,
    pub annual_debt_service: f64,
    pub debt_service_coverage_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalIncomeRow {
    pub unit_type: String,
    pub homes: u32,
    pub monthly_rent: f64,
    pub annual_rent_per_home: f64,
    pub occupancy_rate: f64,
    pub annual_income: f64,
}

/// Year-1 operating expenses as shown in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub annual_property_management: f64,
    pub annual_maintenance: f64,
    pub annual_property_taxes: f64,
    pub annual_insurance: f64,
    #[serde(rename = "annualHOAFees")]
    pub annual_hoa_fees: f64,
    pub other_annual_expenses: f64,
    pub annual_vacancy_loss: f64,
    pub total_operating_expenses: f64,
    /// Occupancy at which year-1 NOI just covers debt service
    pub break_even_occupancy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCashflow {
    pub year: u32,
    pub gross_income: f64,
    pub operating_expenses: f64,
    pub net_operating_income: f64,
    pub debt_service: f64,
    pub cash_flow: f64,
    /// Cash yield as a fraction
    pub cash_flow_yield: f64,
}

impl From<&AnnualCashflow> for ReportCashflow {
    fn from(row: &AnnualCashflow) -> Self {
        Self {
            year: row.year,
            gross_income: row.rental_income,
            operating_expenses: row.operating_expenses,
            net_operating_income: row.noi,
            debt_service: row.debt_service,
            cash_flow: row.cash_flow_after_debt_service,
            cash_flow_yield: row.cash_yield / 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSaleReport {
    pub exit_cap_rate: f64,
    pub exit_value: f64,
    pub transaction_costs: f64,
    pub remaining_loan_balance: f64,
    pub net_proceeds: f64,
    #[serde(rename = "estimatedIRR")]
    pub estimated_irr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualSalesReport {
    pub average_home_price: f64,
    pub total_sales_value: f64,
    pub transaction_cost_percent: f64,
    pub total_transaction_costs: f64,
    pub net_proceeds: f64,
    #[serde(rename = "estimatedIRR")]
    pub estimated_irr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitStrategyReport {
    pub selected: ExitStrategy,
    pub portfolio_sale: PortfolioSaleReport,
    pub individual_sales: IndividualSalesReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuePoint {
    /// Year number without the "Year " prefix
    pub year: String,
    pub value: f64,
}

/// Everything the printable report shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub title: String,
    pub generated_on: NaiveDate,
    pub overview: ProjectOverview,
    pub financial_summary: FinancialSummary,
    pub cost_breakdown: CostBreakdown,
    pub financing: Financing,
    pub rental_income: Vec<RentalIncomeRow>,
    pub total_annual_income: f64,
    pub operating_expenses: ExpenseSummary,
    pub cash_flows: Vec<ReportCashflow>,
    pub exit_strategy: ExitStrategyReport,
    pub portfolio_value: Vec<PortfolioValuePoint>,
}

impl ReportData {
    /// Build the report for the configured exit strategy, with the
    /// alternative strategy alongside for comparison
    pub fn build(assumptions: &Assumptions, comparison: &ExitComparison, generated_on: NaiveDate) -> Self {
        let selected = assumptions.exit.exit_strategy;
        let result = comparison.get(selected);
        let acquisition = &result.acquisition_summary;
        let homes = assumptions.portfolio.total_homes;

        let first = result.first_year();
        let year_one_noi = first.map(|r| r.noi).unwrap_or(0.0);
        let initial_value = result
            .portfolio_value_chart_data
            .first()
            .map(|p| p.portfolio_value)
            .unwrap_or(0.0);

        let occupancy = 1.0 - assumptions.operating.vacancy_rate;
        let rental_income: Vec<RentalIncomeRow> = [("3-Bedroom Homes", 0), ("4-Bedroom Homes", 1)]
            .iter()
            .map(|&(label, idx)| {
                let (count, unit) = assumptions.unit_types()[idx];
                RentalIncomeRow {
                    unit_type: label.to_string(),
                    homes: count,
                    monthly_rent: unit.monthly_rent,
                    annual_rent_per_home: unit.monthly_rent * 12.0,
                    occupancy_rate: occupancy,
                    annual_income: count as f64 * unit.monthly_rent * 12.0 * occupancy,
                }
            })
            .collect();

        let land_cost_per_home = assumptions.three_bed.acquisition_price * LAND_COST_SHARE;
        let construction_cost_per_home = assumptions.three_bed.acquisition_price * CONSTRUCTION_COST_SHARE;

        Self {
            title: "BTR Investment Financial Analysis".to_string(),
            generated_on,
            overview: ProjectOverview {
                investment_type: "Build-to-Rent (BTR)".to_string(),
                total_homes: homes,
                three_bed_homes: assumptions.portfolio.three_bed_count,
                four_bed_homes: assumptions.portfolio.four_bed_count,
                investment_years: assumptions.exit.hold_period_years,
            },
            financial_summary: FinancialSummary {
                total_investment: acquisition.equity_required,
                irr: result.returns.irr,
                cash_on_cash_return: result.returns.average_annual_cash_yield / 100.0,
                cap_rate: if initial_value > 0.0 { year_one_noi / initial_value } else { 0.0 },
                equity_multiple: result.returns.equity_multiple,
                payback_period: payback_period(result),
            },
            cost_breakdown: CostBreakdown {
                land_cost_per_home,
                construction_cost_per_home,
                other_costs_per_home: OTHER_COSTS_PER_HOME,
                total_acquisition_costs: acquisition.total_acquisition_cost,
                total_financing_costs: 0.0,
                total_project_cost: acquisition.total_acquisition_cost,
            },
            financing: Financing {
                ltc: assumptions.capital.loan_to_value,
                loan_amount: acquisition.loan_amount,
                equity_amount: acquisition.equity_required,
                interest_rate: assumptions.capital.interest_rate,
                loan_term: DEFAULT_LOAN_TERM_YEARS,
                annual_debt_service: acquisition.annual_interest_only_payment,
                debt_service_coverage_ratio: first.and_then(|r| r.dscr),
            },
            total_annual_income: first.map(|r| r.rental_income).unwrap_or(0.0),
            rental_income,
            operating_expenses: expense_summary(assumptions, result),
            cash_flows: result.cash_flows.iter().map(ReportCashflow::from).collect(),
            exit_strategy: exit_report(assumptions, comparison),
            portfolio_value: result
                .portfolio_value_chart_data
                .iter()
                .map(|p| PortfolioValuePoint {
                    year: p.year.trim_start_matches("Year ").to_string(),
                    value: p.portfolio_value,
                })
                .collect(),
        }
    }
}

fn expense_summary(assumptions: &Assumptions, result: &ProjectionResult) -> ExpenseSummary {
    let Some(first) = result.first_year() else {
        return ExpenseSummary {
            annual_property_management: 0.0,
            annual_maintenance: 0.0,
            annual_property_taxes: 0.0,
            annual_insurance: 0.0,
            annual_hoa_fees: 0.0,
            other_annual_expenses: 0.0,
            annual_vacancy_loss: 0.0,
            total_operating_expenses: 0.0,
            break_even_occupancy: None,
        };
    };
    let detail = &first.expense_detail;

    // NOI at occupancy o: o * P * (1 - mgmt - maint) - taxes - per-home costs
    let op = &assumptions.operating;
    let variable_margin = first.potential_rental_income * (1.0 - op.property_management_fee - op.maintenance_cost);
    let fixed = detail.property_taxes + detail.insurance + detail.hoa_fees + detail.other;
    let break_even_occupancy = if variable_margin > 0.0 {
        Some((first.debt_service + fixed) / variable_margin)
    } else {
        None
    };

    ExpenseSummary {
        annual_property_management: detail.property_management,
        annual_maintenance: detail.maintenance,
        annual_property_taxes: detail.property_taxes,
        annual_insurance: detail.insurance,
        annual_hoa_fees: detail.hoa_fees,
        other_annual_expenses: detail.other,
        annual_vacancy_loss: first.potential_rental_income - first.rental_income,
        total_operating_expenses: first.operating_expenses,
        break_even_occupancy,
    }
}

fn exit_report(assumptions: &Assumptions, comparison: &ExitComparison) -> ExitStrategyReport {
    let portfolio = &comparison.portfolio;
    let individual = &comparison.individual;
    let homes = assumptions.portfolio.total_homes;

    ExitStrategyReport {
        selected: assumptions.exit.exit_strategy,
        portfolio_sale: PortfolioSaleReport {
            exit_cap_rate: assumptions.exit.portfolio_exit_cap_rate,
            exit_value: portfolio.exit_summary.gross_sale_proceeds,
            transaction_costs: portfolio.exit_summary.selling_costs,
            remaining_loan_balance: portfolio.exit_summary.remaining_loan_balance,
            net_proceeds: portfolio.exit_summary.net_proceeds_after_debt,
            estimated_irr: portfolio.returns.irr,
        },
        individual_sales: IndividualSalesReport {
            average_home_price: if homes > 0 {
                individual.exit_summary.gross_sale_proceeds / homes as f64
            } else {
                0.0
            },
            total_sales_value: individual.exit_summary.gross_sale_proceeds,
            transaction_cost_percent: assumptions.exit.brokerage_fee,
            total_transaction_costs: individual.exit_summary.selling_costs,
            net_proceeds: individual.exit_summary.net_proceeds_after_debt,
            estimated_irr: individual.returns.irr,
        },
    }
}

/// First hold year in which cumulative LP cash (exit included) reaches the equity
fn payback_period(result: &ProjectionResult) -> Option<u32> {
    let equity = result.acquisition_summary.equity_required;
    let mut cumulative = 0.0;

    for (year, cash) in result.lp_cash_flows.iter().enumerate().skip(1) {
        cumulative += cash;
        if cumulative >= equity {
            return Some(year as u32);
        }
    }
    None
}

/// Flat CSV row for one annual record
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    year: u32,
    rental_income: f64,
    operating_expenses: f64,
    noi: f64,
    debt_service: f64,
    cash_flow_after_debt_service: f64,
    preferred_return_paid: f64,
    unpaid_preferred_return: f64,
    lp_distribution: f64,
    gp_distribution: f64,
    dscr: Option<f64>,
    cash_yield: f64,
}

/// Write annual records as CSV with a header row
pub fn write_cashflows_csv<W: Write>(writer: W, cash_flows: &[AnnualCashflow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for row in cash_flows {
        csv_writer.serialize(CsvRow {
            year: row.year,
            rental_income: row.rental_income,
            operating_expenses: row.operating_expenses,
            noi: row.noi,
            debt_service: row.debt_service,
            cash_flow_after_debt_service: row.cash_flow_after_debt_service,
            preferred_return_paid: row.preferred_return_paid,
            unpaid_preferred_return: row.unpaid_preferred_return,
            lp_distribution: row.lp_distribution,
            gp_distribution: row.gp_distribution,
            dscr: row.dscr,
            cash_yield: row.cash_yield,
        })?;
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
