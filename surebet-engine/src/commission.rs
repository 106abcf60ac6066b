//! Bookmaker commission on winnings.
//!
//! Betting exchanges charge a percentage of net winnings rather than building a margin into
//! their prices. Converting their quotes to net odds lets them be compared with fixed-odds
//! bookmakers using the same arbitrage arithmetic.

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

/// Commission calculations for exchange-style bookmakers.
pub struct CommissionCalculator;

impl CommissionCalculator {
    /// Net decimal odds after commission on winnings.
    ///
    /// Formula: 1 + (odds - 1) * (1 - commission)
    ///
    /// Non-finite odds are returned unchanged; selection validation rejects them later.
    pub fn net_odds(odds: f64, commission: Decimal) -> f64 {
        let Some(gross) = Decimal::from_f64(odds) else {
            return odds;
        };

        let net = Decimal::ONE + (gross - Decimal::ONE) * (Decimal::ONE - commission);
        net.to_f64().unwrap_or(odds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_net_odds() {
        // 1 + 1.00 * 0.95 = 1.95
        assert!((CommissionCalculator::net_odds(2.00, dec!(0.05)) - 1.95).abs() < 1e-12);

        // 1 + 3.20 * 0.98 = 4.136
        assert!((CommissionCalculator::net_odds(4.20, dec!(0.02)) - 4.136).abs() < 1e-12);
    }

    #[test]
    fn test_net_odds_zero_commission() {
        assert_eq!(CommissionCalculator::net_odds(3.40, Decimal::ZERO), 3.40);
    }

    #[test]
    fn test_net_odds_non_finite_passthrough() {
        assert!(CommissionCalculator::net_odds(f64::NAN, dec!(0.05)).is_nan());
    }
}
