//! Assumption set for a build-to-rent portfolio projection
//!
//! One frozen [`Assumptions`] value drives one projection run. Rates are
//! fractional (0.055 = 5.5%), money is in dollars.

pub mod loader;

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

pub use loader::{load_assumptions, DEFAULT_ASSUMPTIONS_PATH};

/// Tolerance used when checking that the LP and GP splits sum to one
pub const SPLIT_TOLERANCE: f64 = 1e-9;

/// How the portfolio is disposed of at the end of the hold period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStrategy {
    /// Bulk sale priced by direct capitalization of the final year's NOI
    Portfolio,
    /// Homes sold one by one at appreciated market value plus a premium
    Individual,
}

impl ExitStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitStrategy::Portfolio => "portfolio",
            ExitStrategy::Individual => "individual",
        }
    }

    /// The other strategy, used when comparing both exits side by side
    pub fn alternative(&self) -> Self {
        match self {
            ExitStrategy::Portfolio => ExitStrategy::Individual,
            ExitStrategy::Individual => ExitStrategy::Portfolio,
        }
    }
}

impl fmt::Display for ExitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExitStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portfolio" => Ok(ExitStrategy::Portfolio),
            "individual" => Ok(ExitStrategy::Individual),
            other => Err(format!(
                "unknown exit strategy: {} (expected portfolio or individual)",
                other
            )),
        }
    }
}

/// Home counts in the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMix {
    /// Total homes, drives the per-home expense lines
    pub total_homes: u32,
    pub three_bed_count: u32,
    pub four_bed_count: u32,
}

/// Fund and debt structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalStructure {
    /// Annual preferred return owed to LPs on required equity
    pub preferred_return: f64,
    pub lp_split: f64,
    pub gp_split: f64,
    pub loan_to_value: f64,
    pub interest_rate: f64,
    pub interest_only: bool,
    /// Interest-only period in years
    pub interest_only_period: u32,
}

/// Per-home economics for one unit type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEconomics {
    pub acquisition_price: f64,
    pub market_value: f64,
    pub monthly_rent: f64,
}

/// Growth and operating cost assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingAssumptions {
    pub home_price_appreciation: f64,
    pub annual_rent_growth: f64,
    pub vacancy_rate: f64,
    /// Share of effective rental income
    pub property_management_fee: f64,
    /// Share of effective rental income
    pub maintenance_cost: f64,
    /// Share of portfolio market value
    pub property_tax_rate: f64,
    pub insurance_cost_per_home: f64,
    pub hoa_fees_per_home: f64,
    pub other_expenses_per_home: f64,
}

/// Disposition assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitAssumptions {
    pub hold_period_years: u32,
    pub exit_strategy: ExitStrategy,
    pub portfolio_exit_cap_rate: f64,
    pub brokerage_fee: f64,
    pub individual_sales_premium: f64,
}

/// Container for all projection assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assumptions {
    pub portfolio: PortfolioMix,
    pub capital: CapitalStructure,
    pub three_bed: UnitEconomics,
    pub four_bed: UnitEconomics,
    pub operating: OperatingAssumptions,
    pub exit: ExitAssumptions,
}

impl Default for Assumptions {
    /// 500-home base case: 250 three-bed and 250 four-bed homes, 60% LTV,
    /// 8% preferred return, 80/20 split, seven year hold, portfolio exit.
    fn default() -> Self {
        Self {
            portfolio: PortfolioMix {
                total_homes: 500,
                three_bed_count: 250,
                four_bed_count: 250,
            },
            capital: CapitalStructure {
                preferred_return: 0.08,
                lp_split: 0.80,
                gp_split: 0.20,
                loan_to_value: 0.60,
                interest_rate: 0.055,
                interest_only: true,
                interest_only_period: 10,
            },
            three_bed: UnitEconomics {
                acquisition_price: 240_000.0,
                market_value: 310_000.0,
                monthly_rent: 2_100.0,
            },
            four_bed: UnitEconomics {
                acquisition_price: 311_695.0,
                market_value: 360_000.0,
                monthly_rent: 2_400.0,
            },
            operating: OperatingAssumptions {
                home_price_appreciation: 0.03,
                annual_rent_growth: 0.03,
                vacancy_rate: 0.05,
                property_management_fee: 0.08,
                maintenance_cost: 0.05,
                property_tax_rate: 0.01,
                insurance_cost_per_home: 1_200.0,
                hoa_fees_per_home: 0.0,
                other_expenses_per_home: 0.0,
            },
            exit: ExitAssumptions {
                hold_period_years: 7,
                exit_strategy: ExitStrategy::Portfolio,
                portfolio_exit_cap_rate: 0.055,
                brokerage_fee: 0.05,
                individual_sales_premium: 0.05,
            },
        }
    }
}

impl Assumptions {
    /// Unit types paired with their home counts
    pub fn unit_types(&self) -> [(u32, &UnitEconomics); 2] {
        [
            (self.portfolio.three_bed_count, &self.three_bed),
            (self.portfolio.four_bed_count, &self.four_bed),
        ]
    }

    /// Portfolio market value after `years` of appreciation
    pub fn market_value_after(&self, years: u32) -> f64 {
        let growth = (1.0 + self.operating.home_price_appreciation).powi(years as i32);
        self.unit_types()
            .iter()
            .map(|(count, unit)| *count as f64 * unit.market_value * growth)
            .sum()
    }

    /// Annual potential rent (before vacancy) in a given 1-indexed year
    pub fn potential_rent(&self, year: u32) -> f64 {
        let growth = (1.0 + self.operating.annual_rent_growth).powi(year as i32 - 1);
        self.unit_types()
            .iter()
            .map(|(count, unit)| *count as f64 * unit.monthly_rent * 12.0 * growth)
            .sum()
    }

    /// Copy with a different hold period
    pub fn with_hold_period(&self, years: u32) -> Self {
        let mut next = self.clone();
        next.exit.hold_period_years = years;
        next
    }

    /// Copy with a different exit strategy
    pub fn with_exit_strategy(&self, strategy: ExitStrategy) -> Self {
        let mut next = self.clone();
        next.exit.exit_strategy = strategy;
        next
    }

    /// Copy with a different portfolio exit cap rate
    pub fn with_exit_cap_rate(&self, cap_rate: f64) -> Self {
        let mut next = self.clone();
        next.exit.portfolio_exit_cap_rate = cap_rate;
        next
    }

    /// Reject assumption sets the engine cannot project meaningfully
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.numeric_fields() {
            if !value.is_finite() {
                return Err(ModelError::invalid(field, format!("{} is not a finite number", value)));
            }
        }

        let split = self.capital.lp_split + self.capital.gp_split;
        if (split - 1.0).abs() > SPLIT_TOLERANCE {
            return Err(ModelError::invalid(
                "lpSplit",
                format!("LP and GP splits must sum to 1.0, got {}", split),
            ));
        }

        if self.exit.hold_period_years < 1 {
            return Err(ModelError::invalid("holdPeriodYears", "hold period must be at least one year"));
        }

        let total_cost: f64 = self
            .unit_types()
            .iter()
            .map(|(count, unit)| *count as f64 * unit.acquisition_price)
            .sum();
        if total_cost * (1.0 - self.capital.loan_to_value) <= 0.0 {
            return Err(ModelError::invalid(
                "loanToValue",
                "required equity must be positive for cash yield and equity multiple",
            ));
        }

        if self.exit.exit_strategy == ExitStrategy::Portfolio && self.exit.portfolio_exit_cap_rate <= 0.0 {
            return Err(ModelError::invalid(
                "portfolioExitCapRate",
                "cap rate must be positive for a portfolio exit",
            ));
        }

        let unit_total = u64::from(self.portfolio.three_bed_count) + u64::from(self.portfolio.four_bed_count);
        if unit_total != u64::from(self.portfolio.total_homes) {
            warn!(
                "total homes ({}) differs from unit mix ({} three-bed + {} four-bed); per-home costs use total homes",
                self.portfolio.total_homes, self.portfolio.three_bed_count, self.portfolio.four_bed_count
            );
        }

        if !self.capital.interest_only || self.capital.interest_only_period < self.exit.hold_period_years {
            warn!("debt service is modelled as interest-only for the whole hold period; amortization is not applied");
        }

        Ok(())
    }

    fn numeric_fields(&self) -> [(&'static str, f64); 23] {
        [
            ("preferredReturn", self.capital.preferred_return),
            ("lpSplit", self.capital.lp_split),
            ("gpSplit", self.capital.gp_split),
            ("loanToValue", self.capital.loan_to_value),
            ("interestRate", self.capital.interest_rate),
            ("acquisitionPrice3Bed", self.three_bed.acquisition_price),
            ("marketValue3Bed", self.three_bed.market_value),
            ("monthlyRent3Bed", self.three_bed.monthly_rent),
            ("acquisitionPrice4Bed", self.four_bed.acquisition_price),
            ("marketValue4Bed", self.four_bed.market_value),
            ("monthlyRent4Bed", self.four_bed.monthly_rent),
            ("homePriceAppreciation", self.operating.home_price_appreciation),
            ("annualRentGrowth", self.operating.annual_rent_growth),
            ("vacancyRate", self.operating.vacancy_rate),
            ("propertyManagementFee", self.operating.property_management_fee),
            ("maintenanceCost", self.operating.maintenance_cost),
            ("propertyTaxRate", self.operating.property_tax_rate),
            ("insuranceCostPerHome", self.operating.insurance_cost_per_home),
            ("hoaFeesPerHome", self.operating.hoa_fees_per_home),
            ("otherExpensesPerHome", self.operating.other_expenses_per_home),
            ("portfolioExitCapRate", self.exit.portfolio_exit_cap_rate),
            ("brokerageFee", self.exit.brokerage_fee),
            ("individualSalesPremium", self.exit.individual_sales_premium),
        ]
    }
}
