use crate::cover::OutcomeCover;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Result of pricing one [`OutcomeCover`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Evaluation {
    /// Sum of implied probabilities, `Σ 1/odds`.
    pub arbitrage_index: f64,
    /// Guaranteed return on the total stake, `(1 - arbitrage_index) * 100`. Unrounded.
    pub profit_percent: f64,
    /// `arbitrage_index < 1.0`.
    pub is_surebet: bool,
}

/// Computes the arbitrage index of a cover.
pub struct ArbitrageEvaluator;

impl ArbitrageEvaluator {
    pub fn evaluate(cover: &OutcomeCover) -> Option<Evaluation> {
        let odds = cover.odds().collect::<Vec<_>>();
        let evaluation = Self::evaluate_odds(&odds)?;

        trace!(
            event_id = %cover.event_id(),
            market_id = %cover.market_id(),
            ?odds,
            arbitrage_index = evaluation.arbitrage_index,
            is_surebet = evaluation.is_surebet,
            "evaluated cover"
        );
        Some(evaluation)
    }

    /// Evaluate a raw set of decimal odds, one per outcome.
    ///
    /// Returns `None` for an empty set or if any odds are non-finite or not positive.
    pub fn evaluate_odds(odds: &[f64]) -> Option<Evaluation> {
        if odds.is_empty() {
            return None;
        }
        if let Some(bad) = odds.iter().find(|odds| !odds.is_finite() || **odds <= 0.0) {
            warn!(odds = *bad, "cannot evaluate cover with invalid odds, skipping");
            return None;
        }

        let arbitrage_index = odds.iter().map(|odds| 1.0 / odds).sum::<f64>();

        Some(Evaluation {
            arbitrage_index,
            profit_percent: (1.0 - arbitrage_index) * 100.0,
            is_surebet: arbitrage_index < 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surebet_instrument::Selection;

    #[test]
    fn test_three_way_surebet() {
        // 1/2.30 + 1/3.60 + 1/4.80 = 0.920894
        let evaluation = ArbitrageEvaluator::evaluate_odds(&[2.30, 3.60, 4.80]).unwrap();
        assert!(evaluation.is_surebet);
        assert!((evaluation.arbitrage_index - 0.920_893_7).abs() < 1e-6);
        assert!((evaluation.profit_percent - 7.910_628).abs() < 1e-5);
    }

    #[test]
    fn test_three_way_overround() {
        // 1/2.10 + 1/3.40 + 1/4.20 = 1.008403, a bookmaker margin rather than an arbitrage
        let evaluation = ArbitrageEvaluator::evaluate_odds(&[2.10, 3.40, 4.20]).unwrap();
        assert!(!evaluation.is_surebet);
        assert!((evaluation.arbitrage_index - 1.008_403).abs() < 1e-6);
    }

    #[test]
    fn test_two_way_not_surebet() {
        let evaluation = ArbitrageEvaluator::evaluate_odds(&[1.5, 1.5]).unwrap();
        assert!(!evaluation.is_surebet);
        assert!((evaluation.arbitrage_index - 4.0 / 3.0).abs() < 1e-12);
        assert!(evaluation.profit_percent < 0.0);
    }

    #[test]
    fn test_break_even_is_not_surebet() {
        let evaluation = ArbitrageEvaluator::evaluate_odds(&[2.0, 2.0]).unwrap();
        assert_eq!(evaluation.arbitrage_index, 1.0);
        assert!(!evaluation.is_surebet);
    }

    #[test]
    fn test_invalid_odds_skipped() {
        assert_eq!(ArbitrageEvaluator::evaluate_odds(&[]), None);
        assert_eq!(ArbitrageEvaluator::evaluate_odds(&[2.0, 0.0]), None);
        assert_eq!(ArbitrageEvaluator::evaluate_odds(&[2.0, -3.0]), None);
        assert_eq!(ArbitrageEvaluator::evaluate_odds(&[2.0, f64::INFINITY]), None);
        assert_eq!(ArbitrageEvaluator::evaluate_odds(&[f64::NAN, 2.0]), None);
    }

    #[test]
    fn test_evaluate_cover_is_deterministic() {
        let cover = OutcomeCover::new(
            "evt",
            "ML",
            vec![
                Selection::new("Home", 2.05, "A").unwrap(),
                Selection::new("Away", 2.10, "B").unwrap(),
            ],
        )
        .unwrap();

        let first = ArbitrageEvaluator::evaluate(&cover).unwrap();
        let second = ArbitrageEvaluator::evaluate(&cover).unwrap();
        assert_eq!(first, second);
        assert!(first.is_surebet);
        assert_eq!(
            first.is_surebet,
            cover.odds().map(|odds| 1.0 / odds).sum::<f64>() < 1.0
        );
    }
}
