//! Acquisition sizing

use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;

/// Capital required to buy the portfolio, fixed for the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionSummary {
    pub total_homes: u32,
    pub total_acquisition_cost: f64,
    pub loan_amount: f64,
    pub equity_required: f64,
    pub loan_to_value: f64,
    pub annual_interest_only_payment: f64,
}

impl AcquisitionSummary {
    pub fn from_assumptions(assumptions: &Assumptions) -> Self {
        let total_acquisition_cost: f64 = assumptions
            .unit_types()
            .iter()
            .map(|(count, unit)| *count as f64 * unit.acquisition_price)
            .sum();

        let loan_amount = total_acquisition_cost * assumptions.capital.loan_to_value;
        let equity_required = total_acquisition_cost - loan_amount;

        Self {
            total_homes: assumptions.portfolio.total_homes,
            total_acquisition_cost,
            loan_amount,
            equity_required,
            loan_to_value: assumptions.capital.loan_to_value,
            annual_interest_only_payment: loan_amount * assumptions.capital.interest_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_base_case_sizing() {
        let summary = AcquisitionSummary::from_assumptions(&Assumptions::default());

        assert_eq!(summary.total_homes, 500);
        assert_abs_diff_eq!(summary.total_acquisition_cost, 137_923_750.0, epsilon = 1e-4);
        assert_abs_diff_eq!(summary.loan_amount, 82_754_250.0, epsilon = 1e-4);
        assert_abs_diff_eq!(summary.equity_required, 55_169_500.0, epsilon = 1e-4);
        assert_abs_diff_eq!(summary.annual_interest_only_payment, 4_551_483.75, epsilon = 1e-4);
    }

    #[test]
    fn test_loan_plus_equity_is_cost() {
        for ltv in [0.0, 0.35, 0.6, 0.75, 0.9] {
            let mut a = Assumptions::default();
            a.capital.loan_to_value = ltv;
            a.portfolio.three_bed_count = 137;
            a.four_bed.acquisition_price = 298_123.45;

            let s = AcquisitionSummary::from_assumptions(&a);
            assert_abs_diff_eq!(s.loan_amount + s.equity_required, s.total_acquisition_cost, epsilon = 1e-6);
        }
    }
}
