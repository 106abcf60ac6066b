use crate::{
    id::{EventId, MarketId, MarketKey, OutcomeName},
    selection::{Selection, SelectionRecord},
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a set of selections cannot form an [`OddsSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("market {key} has {outcomes} distinct outcome(s), at least 2 are required")]
    Degenerate { key: MarketKey, outcomes: usize },
}

/// Raw odds for one event/market as delivered by the feed layer.
///
/// Selections have not been validated yet and may contain odds that cannot
/// profit; the engine filters those before building an [`OddsSnapshot`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SnapshotRecord {
    pub event_id: EventId,
    pub market_id: MarketId,
    pub selections: Vec<SelectionRecord>,
    pub observed_at: DateTime<Utc>,
}

impl SnapshotRecord {
    pub fn new(
        event_id: impl Into<EventId>,
        market_id: impl Into<MarketId>,
        selections: Vec<SelectionRecord>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            market_id: market_id.into(),
            selections,
            observed_at,
        }
    }

    pub fn key(&self) -> MarketKey {
        MarketKey::new(self.event_id.clone(), self.market_id.clone())
    }
}

/// Validated, immutable view of one event/market across every bookmaker quoting it.
///
/// Holds at least two distinct outcomes, since a single-outcome market can't be hedged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsSnapshot {
    event_id: EventId,
    market_id: MarketId,
    selections: Vec<Selection>,
    observed_at: DateTime<Utc>,
}

impl OddsSnapshot {
    pub fn new(
        event_id: impl Into<EventId>,
        market_id: impl Into<MarketId>,
        selections: Vec<Selection>,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        let event_id = event_id.into();
        let market_id = market_id.into();

        let outcomes = selections
            .iter()
            .map(Selection::outcome_name)
            .unique()
            .count();

        if outcomes < 2 {
            return Err(SnapshotError::Degenerate {
                key: MarketKey::new(event_id, market_id),
                outcomes,
            });
        }

        Ok(Self {
            event_id,
            market_id,
            selections,
            observed_at,
        })
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    pub fn key(&self) -> MarketKey {
        MarketKey::new(self.event_id.clone(), self.market_id.clone())
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Distinct outcome names, in order of first appearance.
    pub fn outcomes(&self) -> impl Iterator<Item = &OutcomeName> {
        self.selections
            .iter()
            .map(Selection::outcome_name)
            .unique()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(outcome: &str, odds: f64, bookmaker: &str) -> Selection {
        Selection::new(outcome, odds, bookmaker).unwrap()
    }

    #[test]
    fn test_snapshot_requires_two_outcomes() {
        let result = OddsSnapshot::new(
            "evt",
            "OU2.5",
            vec![
                selection("Over 2.5", 1.90, "bet365"),
                selection("Over 2.5", 1.95, "pinnacle"),
            ],
            Utc::now(),
        );

        assert_eq!(
            result,
            Err(SnapshotError::Degenerate {
                key: MarketKey::new(EventId::from("evt"), MarketId::from("OU2.5")),
                outcomes: 1,
            })
        );
    }

    #[test]
    fn test_empty_snapshot_is_degenerate() {
        let result = OddsSnapshot::new("evt", "1X2", vec![], Utc::now());
        assert!(matches!(
            result,
            Err(SnapshotError::Degenerate { outcomes: 0, .. })
        ));
    }

    #[test]
    fn test_outcomes_in_first_appearance_order() {
        let snapshot = OddsSnapshot::new(
            "evt",
            "1X2",
            vec![
                selection("Away", 4.20, "bet365"),
                selection("Home", 2.10, "pinnacle"),
                selection("Away", 4.00, "betfair"),
                selection("Draw", 3.40, "betfair"),
            ],
            Utc::now(),
        )
        .unwrap();

        let outcomes: Vec<&str> = snapshot.outcomes().map(OutcomeName::as_str).collect();
        assert_eq!(outcomes, vec!["Away", "Home", "Draw"]);
        assert_eq!(snapshot.key().to_string(), "evt/1X2");
    }
}
