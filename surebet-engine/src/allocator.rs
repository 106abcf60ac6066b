//! Stake allocation across the lines of a surebet.
//!
//! Each line receives a share of the total stake proportional to its implied probability, so
//! every outcome pays out the same gross return:
//!
//! ```text
//! raw_amount_i = total_stake * (1 / odds_i) / arbitrage_index
//! payout       = raw_amount_i * odds_i = total_stake / arbitrage_index
//! ```
//!
//! Amounts are then rounded to the currency's minimum unit and the rounding residual is given
//! to the largest line, so the rounded amounts always sum exactly to the total stake.

use crate::{cover::OutcomeCover, error::AllocationError, evaluator::Evaluation, opportunity::StakeLine};
use rust_decimal::{Decimal, prelude::ToPrimitive};

#[derive(Debug, Clone, Copy)]
pub struct StakeAllocator {
    decimal_places: u32,
}

impl Default for StakeAllocator {
    fn default() -> Self {
        Self::new(2)
    }
}

impl StakeAllocator {
    pub fn new(decimal_places: u32) -> Self {
        Self { decimal_places }
    }

    /// Smallest stake increment, eg/ 0.01 for 2 decimal places.
    pub fn minimum_unit(&self) -> Result<Decimal, AllocationError> {
        Decimal::try_new(1, self.decimal_places)
            .map_err(|_| AllocationError::UnsupportedScale(self.decimal_places))
    }

    pub fn allocate(
        &self,
        cover: &OutcomeCover,
        evaluation: &Evaluation,
        total_stake: Decimal,
    ) -> Result<Vec<StakeLine>, AllocationError> {
        if total_stake <= Decimal::ZERO {
            return Err(AllocationError::NonPositiveStake(total_stake));
        }

        let lines = cover.len();
        let unit = self.minimum_unit()?;
        let precision = |reason| AllocationError::Precision {
            total_stake,
            lines,
            unit,
            reason,
        };

        if total_stake.round_dp(self.decimal_places) != total_stake {
            return Err(precision("total stake is not a multiple of the minimum unit"));
        }
        if total_stake < unit * Decimal::from(lines) {
            return Err(precision("total stake is smaller than one unit per line"));
        }
        let total = total_stake
            .to_f64()
            .ok_or_else(|| precision("total stake is not representable as f64"))?;

        let total_weight = evaluation.arbitrage_index;
        let mut stakes = cover
            .selections()
            .iter()
            .map(|selection| {
                let weight = 1.0 / selection.odds();
                let raw_amount = total * weight / total_weight;
                let amount = Decimal::from_f64_retain(raw_amount)
                    .map(|amount| amount.round_dp(self.decimal_places))
                    .ok_or_else(|| precision("raw amount is not finite"))?;

                Ok(StakeLine {
                    bookmaker_id: selection.bookmaker_id().clone(),
                    outcome_name: selection.outcome_name().clone(),
                    odds: selection.odds(),
                    amount,
                    raw_amount,
                    percentage: weight / total_weight * 100.0,
                })
            })
            .collect::<Result<Vec<_>, AllocationError>>()?;

        let allocated = stakes.iter().map(|line| line.amount).sum::<Decimal>();
        let residual = total_stake - allocated;
        if !residual.is_zero() {
            let largest = stakes
                .iter_mut()
                .reduce(|largest, line| {
                    if line.raw_amount > largest.raw_amount {
                        line
                    } else {
                        largest
                    }
                })
                .ok_or_else(|| precision("cover has no lines"))?;
            largest.amount += residual;
        }

        if stakes.iter().any(|line| line.amount <= Decimal::ZERO) {
            return Err(precision("a line rounds to zero"));
        }

        Ok(stakes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ArbitrageEvaluator;
    use rust_decimal_macros::dec;
    use surebet_instrument::Selection;

    fn cover(odds: &[f64]) -> OutcomeCover {
        let outcomes = ["Home", "Draw", "Away", "Other"];
        let bookmakers = ["A", "B", "C", "D"];
        OutcomeCover::new(
            "evt",
            "1X2",
            odds.iter()
                .enumerate()
                .map(|(i, odds)| Selection::new(outcomes[i], *odds, bookmakers[i]).unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn allocate(odds: &[f64], total_stake: Decimal) -> Result<Vec<StakeLine>, AllocationError> {
        let cover = cover(odds);
        let evaluation = ArbitrageEvaluator::evaluate(&cover).unwrap();
        StakeAllocator::default().allocate(&cover, &evaluation, total_stake)
    }

    #[test]
    fn test_three_way_allocation() {
        let stakes = allocate(&[2.30, 3.60, 4.80], dec!(1000)).unwrap();

        let amounts = stakes.iter().map(|line| line.amount).collect::<Vec<_>>();
        assert_eq!(amounts, vec![dec!(472.13), dec!(301.64), dec!(226.23)]);
        assert_eq!(amounts.iter().sum::<Decimal>(), dec!(1000));

        let percentages = stakes.iter().map(|line| line.percentage).sum::<f64>();
        assert!((percentages - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_payout_across_lines() {
        let stakes = allocate(&[2.05, 3.90, 7.50], dec!(250)).unwrap();

        let payouts = stakes
            .iter()
            .map(|line| line.raw_amount * line.odds)
            .collect::<Vec<_>>();
        for payout in &payouts {
            assert!((payout - payouts[0]).abs() / payouts[0] < 1e-6);
        }
    }

    #[test]
    fn test_residual_goes_to_largest_line() {
        // 100 / 3 = 33.333.. each, rounding leaves 0.01 over
        let stakes = allocate(&[3.3, 3.3, 3.3], dec!(100)).unwrap();

        let amounts = stakes.iter().map(|line| line.amount).collect::<Vec<_>>();
        assert_eq!(amounts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
        assert_eq!(amounts.iter().sum::<Decimal>(), dec!(100));
    }

    #[test]
    fn test_residual_picks_largest_raw_amount() {
        // Lowest odds get the largest stake
        let stakes = allocate(&[3.1, 2.9, 3.1], dec!(100)).unwrap();
        let total = stakes.iter().map(|line| line.amount).sum::<Decimal>();
        assert_eq!(total, dec!(100));

        let largest = stakes
            .iter()
            .max_by(|a, b| a.raw_amount.total_cmp(&b.raw_amount))
            .unwrap();
        assert_eq!(largest.odds, 2.9);
    }

    #[test]
    fn test_non_positive_stake() {
        assert_eq!(
            allocate(&[2.1, 2.1], Decimal::ZERO),
            Err(AllocationError::NonPositiveStake(Decimal::ZERO))
        );
        assert!(matches!(
            allocate(&[2.1, 2.1], dec!(-5)),
            Err(AllocationError::NonPositiveStake(_))
        ));
    }

    #[test]
    fn test_precision_errors() {
        // Fewer units than lines
        assert!(matches!(
            allocate(&[3.3, 3.3, 3.3], dec!(0.02)),
            Err(AllocationError::Precision { lines: 3, .. })
        ));

        // Not expressible in cents
        assert!(matches!(
            allocate(&[2.1, 2.1], dec!(10.005)),
            Err(AllocationError::Precision { .. })
        ));

        // One line would round to nothing
        assert!(matches!(
            allocate(&[1.02, 900.0], dec!(0.02)),
            Err(AllocationError::Precision { .. })
        ));
    }

    #[test]
    fn test_whole_unit_currency() {
        let cover = cover(&[2.30, 3.60, 4.80]);
        let evaluation = ArbitrageEvaluator::evaluate(&cover).unwrap();
        let stakes = StakeAllocator::new(0)
            .allocate(&cover, &evaluation, dec!(1000))
            .unwrap();

        let amounts = stakes.iter().map(|line| line.amount).collect::<Vec<_>>();
        assert_eq!(amounts, vec![dec!(472), dec!(302), dec!(226)]);
    }

    #[test]
    fn test_unsupported_scale() {
        let cover = cover(&[2.30, 3.60, 4.80]);
        let evaluation = ArbitrageEvaluator::evaluate(&cover).unwrap();

        let allocator = StakeAllocator::new(29);
        assert_eq!(allocator.minimum_unit(), Err(AllocationError::UnsupportedScale(29)));
        assert_eq!(
            allocator.allocate(&cover, &evaluation, dec!(100)),
            Err(AllocationError::UnsupportedScale(29))
        );
    }
}
