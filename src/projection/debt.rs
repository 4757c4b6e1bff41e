//! Loan balance helper
//!
//! The annual projection holds debt at the original loan amount for the
//! whole hold period (interest-only). This helper gives the amortizing
//! balance for comparison; it is not used by the cash flow loop or the
//! exit waterfall.

/// Standard amortization term assumed by the report
pub const DEFAULT_LOAN_TERM_YEARS: u32 = 30;

/// Level monthly payment on a fully amortizing loan
pub fn monthly_payment(principal: f64, annual_rate: f64, term_years: u32) -> f64 {
    let total_payments = term_years * 12;
    if total_payments == 0 {
        return principal;
    }

    let monthly_rate = annual_rate / 12.0;
    if monthly_rate == 0.0 {
        return principal / total_payments as f64;
    }

    principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powi(-(total_payments as i32)))
}

/// Outstanding balance after `elapsed_years` of monthly payments, floored at zero
pub fn remaining_loan_balance(principal: f64, annual_rate: f64, term_years: u32, elapsed_years: u32) -> f64 {
    let payment = monthly_payment(principal, annual_rate, term_years);
    let monthly_rate = annual_rate / 12.0;

    let mut balance = principal;
    for _ in 0..elapsed_years * 12 {
        let interest = balance * monthly_rate;
        balance -= payment - interest;
        if balance <= 0.0 {
            return 0.0;
        }
    }

    balance.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_monthly_payment() {
        // $100k at 6% over 30 years is the textbook $599.55
        assert_abs_diff_eq!(monthly_payment(100_000.0, 0.06, 30), 599.55, epsilon = 0.01);
    }

    #[test]
    fn test_balance_runs_down() {
        let principal = 82_754_250.0;
        let after_7 = remaining_loan_balance(principal, 0.055, DEFAULT_LOAN_TERM_YEARS, 7);

        assert!(after_7 < principal);
        assert!(after_7 > 0.8 * principal);
        assert_eq!(remaining_loan_balance(principal, 0.055, DEFAULT_LOAN_TERM_YEARS, 0), principal);
        assert_eq!(remaining_loan_balance(principal, 0.055, DEFAULT_LOAN_TERM_YEARS, 31), 0.0);
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let balance = remaining_loan_balance(120_000.0, 0.0, 10, 5);
        assert_abs_diff_eq!(balance, 60_000.0, epsilon = 1e-6);
    }
}
