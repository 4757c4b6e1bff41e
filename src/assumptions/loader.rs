//! Assumption file loader
//!
//! Two formats are accepted:
//! - JSON, the serialized [`Assumptions`] structure (nested camelCase groups)
//! - CSV assumption sheets with `field,value` rows using the flat input
//!   names (`phase1Homes`, `lpSplit`, `exitStrategy`, ...). Rows override
//!   the base case; fields not listed keep their default.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use super::{Assumptions, ExitStrategy};
use crate::error::{ModelError, Result};

/// Default assumption file used by the CLI
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/base_case.json";

/// One row of an assumption sheet
#[derive(Debug, Deserialize)]
struct SheetRow {
    field: String,
    value: String,
}

/// Load assumptions from a `.json` or `.csv` file
pub fn load_assumptions<P: AsRef<Path>>(path: P) -> Result<Assumptions> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    debug!("loading assumptions from {}", path.display());
    match extension.as_str() {
        "json" => load_json_from_reader(file),
        "csv" => load_sheet_from_reader(file),
        other => Err(ModelError::UnsupportedFormat(other.to_string())),
    }
}

/// Load a JSON assumption set from any reader
pub fn load_json_from_reader<R: Read>(reader: R) -> Result<Assumptions> {
    Ok(serde_json::from_reader(reader)?)
}

/// Load a `field,value` assumption sheet from any reader, applied over the defaults
pub fn load_sheet_from_reader<R: Read>(reader: R) -> Result<Assumptions> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut assumptions = Assumptions::default();

    for result in csv_reader.deserialize() {
        let row: SheetRow = result?;
        apply_field(&mut assumptions, &row.field, &row.value)?;
    }

    Ok(assumptions)
}

fn parse_f64(field: &str, value: &str) -> Result<f64> {
    value.parse().map_err(|_| ModelError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(field: &str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| ModelError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ModelError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Set one named field on the assumption set
pub fn apply_field(a: &mut Assumptions, field: &str, value: &str) -> Result<()> {
    match field {
        "phase1Homes" | "totalHomes" => a.portfolio.total_homes = parse_u32(field, value)?,
        "phase1Bed3" => a.portfolio.three_bed_count = parse_u32(field, value)?,
        "phase1Bed4" => a.portfolio.four_bed_count = parse_u32(field, value)?,

        "preferredReturn" => a.capital.preferred_return = parse_f64(field, value)?,
        "lpSplit" => a.capital.lp_split = parse_f64(field, value)?,
        "gpSplit" => a.capital.gp_split = parse_f64(field, value)?,
        "loanToValue" => a.capital.loan_to_value = parse_f64(field, value)?,
        "interestRate" => a.capital.interest_rate = parse_f64(field, value)?,
        "interestOnly" => a.capital.interest_only = parse_bool(field, value)?,
        "interestOnlyPeriod" => a.capital.interest_only_period = parse_u32(field, value)?,

        "acquisitionPrice3Bed" => a.three_bed.acquisition_price = parse_f64(field, value)?,
        "marketValue3Bed" => a.three_bed.market_value = parse_f64(field, value)?,
        "monthlyRent3Bed" => a.three_bed.monthly_rent = parse_f64(field, value)?,
        "acquisitionPrice4Bed" => a.four_bed.acquisition_price = parse_f64(field, value)?,
        "marketValue4Bed" => a.four_bed.market_value = parse_f64(field, value)?,
        "monthlyRent4Bed" => a.four_bed.monthly_rent = parse_f64(field, value)?,

        "homePriceAppreciation" => a.operating.home_price_appreciation = parse_f64(field, value)?,
        "annualRentGrowth" => a.operating.annual_rent_growth = parse_f64(field, value)?,
        "vacancyRate" => a.operating.vacancy_rate = parse_f64(field, value)?,
        "propertyManagementFee" => a.operating.property_management_fee = parse_f64(field, value)?,
        "maintenanceCost" => a.operating.maintenance_cost = parse_f64(field, value)?,
        "propertyTaxRate" => a.operating.property_tax_rate = parse_f64(field, value)?,
        "insuranceCostPerHome" => a.operating.insurance_cost_per_home = parse_f64(field, value)?,
        "hoaFeesPerHome" => a.operating.hoa_fees_per_home = parse_f64(field, value)?,
        "otherExpensesPerHome" => a.operating.other_expenses_per_home = parse_f64(field, value)?,

        "holdPeriodYears" => a.exit.hold_period_years = parse_u32(field, value)?,
        "exitStrategy" => {
            a.exit.exit_strategy = value.parse::<ExitStrategy>().map_err(|_| ModelError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
            })?
        }
        "portfolioExitCapRate" => a.exit.portfolio_exit_cap_rate = parse_f64(field, value)?,
        "brokerageFee" => a.exit.brokerage_fee = parse_f64(field, value)?,
        "individualSalesPremium" => a.exit.individual_sales_premium = parse_f64(field, value)?,

        other => return Err(ModelError::UnknownField(other.to_string())),
    }
    Ok(())
}
