use crate::{
    commission::CommissionCalculator,
    config::{EngineConfig, OddsBounds},
};
use derive_more::Display;
use surebet_instrument::{
    BookmakerId, EventId, OddsSnapshot, OutcomeName, Selection, SelectionError, SnapshotError,
    SnapshotRecord,
};

/// Why a selection was dropped during normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum RejectionReason {
    #[display("{_0}")]
    Invalid(SelectionError),
    #[display("odds {odds} outside [{}, {}]", bounds.min, bounds.max)]
    OutOfBounds { odds: f64, bounds: OddsBounds },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub bookmaker_id: BookmakerId,
    pub event_id: EventId,
    pub outcome_name: OutcomeName,
    pub reason: RejectionReason,
}

/// Output of [`Normaliser::normalise`]: the validated snapshot (or why none could be built),
/// plus every selection that was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalisedSnapshot {
    pub snapshot: Result<OddsSnapshot, SnapshotError>,
    pub rejected: Vec<Rejection>,
}

/// Turns raw [`SnapshotRecord`]s into validated [`OddsSnapshot`]s.
///
/// Bookmakers charging commission have their odds converted to net odds, invalid or
/// out-of-bounds selections are dropped, and the remainder must still cover at least two
/// outcomes.
#[derive(Debug, Clone)]
pub struct Normaliser {
    config: EngineConfig,
}

impl Normaliser {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn normalise(&self, record: SnapshotRecord) -> NormalisedSnapshot {
        let SnapshotRecord {
            event_id,
            market_id,
            selections,
            observed_at,
        } = record;

        let mut rejected = Vec::new();
        let mut valid = Vec::with_capacity(selections.len());

        for raw in selections {
            let bounds = self.config.bounds_for(&raw.bookmaker_id);
            let odds = match self.config.commission_for(&raw.bookmaker_id) {
                Some(commission) => CommissionCalculator::net_odds(raw.odds, commission),
                None => raw.odds,
            };

            let reason = match Selection::new(raw.outcome_name.clone(), odds, raw.bookmaker_id.clone()) {
                Ok(_) if !bounds.contains(raw.odds) => RejectionReason::OutOfBounds {
                    odds: raw.odds,
                    bounds,
                },
                Ok(selection) => {
                    valid.push(selection);
                    continue;
                }
                Err(error) => RejectionReason::Invalid(error),
            };

            rejected.push(Rejection {
                bookmaker_id: raw.bookmaker_id,
                event_id: event_id.clone(),
                outcome_name: raw.outcome_name,
                reason,
            });
        }

        NormalisedSnapshot {
            snapshot: OddsSnapshot::new(event_id, market_id, valid, observed_at),
            rejected,
        }
    }
}
