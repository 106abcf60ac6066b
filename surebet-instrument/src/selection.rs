use crate::id::{BookmakerId, OutcomeName};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a bookmaker price cannot become a [`Selection`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SelectionError {
    #[error("odds must be a finite number, got {0}")]
    NonFinite(f64),

    #[error("odds {0} do not pay out more than the stake")]
    NotProfitable(f64),
}

/// Raw selection exactly as published by a feed, before any validation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SelectionRecord {
    pub outcome_name: OutcomeName,
    pub odds: f64,
    pub bookmaker_id: BookmakerId,
}

impl SelectionRecord {
    pub fn new(
        outcome_name: impl Into<OutcomeName>,
        odds: f64,
        bookmaker_id: impl Into<BookmakerId>,
    ) -> Self {
        Self {
            outcome_name: outcome_name.into(),
            odds,
            bookmaker_id: bookmaker_id.into(),
        }
    }
}

/// A validated decimal-odds price offered by one bookmaker on one outcome.
///
/// Odds are always finite and strictly greater than `1.0`, so `1 / odds` is a proper implied
/// probability in `(0, 1)`. Fields are private: the only ways in are [`Selection::new`] and
/// deserialisation, which goes through the same check.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "SelectionRecord", into = "SelectionRecord")]
pub struct Selection {
    outcome_name: OutcomeName,
    odds: f64,
    bookmaker_id: BookmakerId,
}

impl Selection {
    pub fn new(
        outcome_name: impl Into<OutcomeName>,
        odds: f64,
        bookmaker_id: impl Into<BookmakerId>,
    ) -> Result<Self, SelectionError> {
        if !odds.is_finite() {
            return Err(SelectionError::NonFinite(odds));
        }
        if odds <= 1.0 {
            return Err(SelectionError::NotProfitable(odds));
        }

        Ok(Self {
            outcome_name: outcome_name.into(),
            odds,
            bookmaker_id: bookmaker_id.into(),
        })
    }

    pub fn outcome_name(&self) -> &OutcomeName {
        &self.outcome_name
    }

    pub fn odds(&self) -> f64 {
        self.odds
    }

    pub fn bookmaker_id(&self) -> &BookmakerId {
        &self.bookmaker_id
    }

    /// Implied probability of the outcome, `1 / odds`.
    pub fn implied_probability(&self) -> f64 {
        1.0 / self.odds
    }
}

impl TryFrom<SelectionRecord> for Selection {
    type Error = SelectionError;

    fn try_from(record: SelectionRecord) -> Result<Self, Self::Error> {
        Self::new(record.outcome_name, record.odds, record.bookmaker_id)
    }
}

impl From<Selection> for SelectionRecord {
    fn from(selection: Selection) -> Self {
        Self {
            outcome_name: selection.outcome_name,
            odds: selection.odds,
            bookmaker_id: selection.bookmaker_id,
        }
    }
}
