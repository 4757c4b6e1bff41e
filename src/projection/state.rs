//! Preferred return state carried from one hold year to the next

/// Accrual state of the LP preferred return
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferredReturnState {
    /// Preferred return owed but not yet paid (simple carry, no interest)
    pub unpaid: f64,

    /// Preferred return paid so far
    pub accumulated: f64,
}

impl PreferredReturnState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one year's cash flow after debt service to the preferred return.
    ///
    /// Pays this year's preferred return plus any accrued balance in full when
    /// the cash covers it, otherwise pays what is available and carries the
    /// shortfall. A negative cash flow is passed through as a negative
    /// payment, drawing down the preferred return paid so far, and the carry
    /// grows by the whole gap. Returns the amount paid.
    pub fn settle(&mut self, cash_flow_after_debt_service: f64, annual_preferred: f64) -> f64 {
        let owed = annual_preferred + self.unpaid;

        let paid = if cash_flow_after_debt_service >= owed {
            self.unpaid = 0.0;
            owed
        } else {
            self.unpaid += annual_preferred - cash_flow_after_debt_service;
            cash_flow_after_debt_service
        };

        self.accumulated += paid;
        paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_full_payment_clears_balance() {
        let mut state = PreferredReturnState::new();
        let paid = state.settle(500.0, 400.0);

        assert_eq!(paid, 400.0);
        assert_eq!(state.unpaid, 0.0);
        assert_eq!(state.accumulated, 400.0);
    }

    #[test]
    fn test_shortfall_accrues() {
        let mut state = PreferredReturnState::new();
        let paid = state.settle(300.0, 400.0);

        assert_eq!(paid, 300.0);
        assert_eq!(state.unpaid, 100.0);

        // Next year covers both the current year and the carry
        let paid = state.settle(600.0, 400.0);
        assert_eq!(paid, 500.0);
        assert_eq!(state.unpaid, 0.0);
        assert_eq!(state.accumulated, 800.0);
    }

    #[test]
    fn test_partial_catch_up_reduces_carry() {
        let mut state = PreferredReturnState::new();
        state.settle(100.0, 400.0);
        assert_eq!(state.unpaid, 300.0);

        // 550 covers this year's 400 and 150 of the carry
        let paid = state.settle(550.0, 400.0);
        assert_eq!(paid, 550.0);
        assert_abs_diff_eq!(state.unpaid, 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_cash_is_a_negative_payment() {
        let mut state = PreferredReturnState::new();
        state.settle(300.0, 400.0);

        let paid = state.settle(-250.0, 400.0);
        assert_eq!(paid, -250.0);
        // 100 carried + 400 this year + 250 shortfall below zero
        assert_abs_diff_eq!(state.unpaid, 750.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.accumulated, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_exact_cover_is_full_payment() {
        let mut state = PreferredReturnState { unpaid: 100.0, accumulated: 0.0 };
        let paid = state.settle(500.0, 400.0);

        assert_eq!(paid, 500.0);
        assert_eq!(state.unpaid, 0.0);
    }
}
