use itertools::Itertools;
use serde::Serialize;
use surebet_instrument::{BookmakerId, EventId, MarketId, MarketKey, OutcomeName, Selection};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoverError {
    #[error("a cover needs at least 2 outcomes, got {0}")]
    TooFewOutcomes(usize),

    #[error("outcome {0} covered more than once")]
    DuplicateOutcome(OutcomeName),

    #[error("bookmaker {0} used for more than one outcome")]
    DuplicateBookmaker(BookmakerId),
}

/// One selection per outcome of a market, each from a different bookmaker.
///
/// Backing every outcome of the market means exactly one line pays out whatever happens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeCover {
    event_id: EventId,
    market_id: MarketId,
    selections: Vec<Selection>,
}

impl OutcomeCover {
    pub fn new(
        event_id: impl Into<EventId>,
        market_id: impl Into<MarketId>,
        selections: Vec<Selection>,
    ) -> Result<Self, CoverError> {
        if selections.len() < 2 {
            return Err(CoverError::TooFewOutcomes(selections.len()));
        }
        if let Some(outcome) = selections.iter().map(Selection::outcome_name).duplicates().next() {
            return Err(CoverError::DuplicateOutcome(outcome.clone()));
        }
        if let Some(bookmaker) = selections.iter().map(Selection::bookmaker_id).duplicates().next() {
            return Err(CoverError::DuplicateBookmaker(bookmaker.clone()));
        }

        Ok(Self::from_parts(event_id.into(), market_id.into(), selections))
    }

    /// Build a cover whose invariants the caller already guarantees.
    pub(crate) fn from_parts(
        event_id: EventId,
        market_id: MarketId,
        selections: Vec<Selection>,
    ) -> Self {
        Self {
            event_id,
            market_id,
            selections,
        }
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

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn odds(&self) -> impl Iterator<Item = f64> + '_ {
        self.selections.iter().map(Selection::odds)
    }

    pub fn bookmakers(&self) -> impl Iterator<Item = &BookmakerId> {
        self.selections.iter().map(Selection::bookmaker_id)
    }
}
