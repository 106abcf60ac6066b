//! Arbitrage opportunity representation.

use crate::{cover::OutcomeCover, evaluator::Evaluation};
use chrono::{DateTime, Duration, Utc};
use derive_more::Display;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use surebet_instrument::{BookmakerId, EventId, MarketId, OutcomeName};

/// Stable identity of an opportunity across detection cycles.
///
/// Format: `"{event_id}:{market_id}:{outcome=bookmaker,...}"` with the pairs sorted by outcome
/// name, so the same bookmakers backing different outcomes are different opportunities.
///
/// `%`, `:`, `,` and `=` inside a component are percent-encoded, keeping distinct covers apart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Deserialize, Serialize)]
#[serde(transparent)]
pub struct OpportunityId(pub SmolStr);

impl OpportunityId {
    pub fn from_cover(cover: &OutcomeCover) -> Self {
        let legs = cover
            .selections()
            .iter()
            .map(|selection| (selection.outcome_name(), selection.bookmaker_id()))
            .sorted()
            .map(|(outcome, bookmaker)| {
                format!("{}={}", escape(outcome.as_str()), escape(bookmaker.as_str()))
            })
            .join(",");

        Self(SmolStr::from(format!(
            "{}:{}:{legs}",
            escape(cover.event_id().as_str()),
            escape(cover.market_id().as_str())
        )))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn escape(component: &str) -> String {
    let mut escaped = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            ',' => escaped.push_str("%2C"),
            '=' => escaped.push_str("%3D"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Stake placed on one selection of a cover.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StakeLine {
    pub bookmaker_id: BookmakerId,
    pub outcome_name: OutcomeName,
    pub odds: f64,
    /// Stake rounded to the currency's minimum unit. Lines sum exactly to the total stake.
    pub amount: Decimal,
    /// Unrounded share of the total stake, `raw_amount * odds` is equal across lines.
    pub raw_amount: f64,
    /// Share of the total stake, in percent.
    pub percentage: f64,
}

impl StakeLine {
    /// Gross return if this line wins, using the rounded amount.
    pub fn payout(&self) -> Decimal {
        Decimal::try_from(self.odds)
            .map(|odds| self.amount * odds)
            .unwrap_or_default()
    }
}

/// A priced surebet produced by one detection cycle, before lifecycle bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub id: OpportunityId,
    pub cover: OutcomeCover,
    pub evaluation: Evaluation,
    /// Empty if the total stake could not be split in the currency's minimum unit.
    pub stakes: Vec<StakeLine>,
}

impl Detection {
    pub fn new(cover: OutcomeCover, evaluation: Evaluation, stakes: Vec<StakeLine>) -> Self {
        Self {
            id: OpportunityId::from_cover(&cover),
            cover,
            evaluation,
            stakes,
        }
    }
}

/// A detected surebet tracked across cycles by the
/// [`OpportunityLifecycleManager`](crate::lifecycle::OpportunityLifecycleManager).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOpportunity {
    pub id: OpportunityId,
    pub cover: OutcomeCover,
    pub arbitrage_index: f64,
    pub profit_percent: f64,
    pub stakes: Vec<StakeLine>,
    pub detected_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl ArbitrageOpportunity {
    /// Activate a fresh detection at `now`.
    pub fn activate(detection: Detection, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: detection.id,
            cover: detection.cover,
            arbitrage_index: detection.evaluation.arbitrage_index,
            profit_percent: detection.evaluation.profit_percent,
            stakes: detection.stakes,
            detected_at: now,
            expires_at: expiry(now, ttl),
            is_active: true,
        }
    }

    /// Re-detected: take the latest prices and stakes, keep `detected_at`.
    pub fn refresh(&mut self, detection: Detection, now: DateTime<Utc>, ttl: Duration) {
        self.cover = detection.cover;
        self.arbitrage_index = detection.evaluation.arbitrage_index;
        self.profit_percent = detection.evaluation.profit_percent;
        self.stakes = detection.stakes;
        self.expires_at = expiry(now, ttl);
        self.is_active = true;
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn event_id(&self) -> &EventId {
        self.cover.event_id()
    }

    pub fn market_id(&self) -> &MarketId {
        self.cover.market_id()
    }

    pub fn bookmakers(&self) -> Vec<BookmakerId> {
        self.cover.bookmakers().cloned().collect()
    }

    pub fn record(&self) -> OpportunityRecord {
        OpportunityRecord::from(self)
    }
}

/// `now + ttl`, saturating at the latest representable instant.
fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Serialisable view of an [`ArbitrageOpportunity`] handed to storage, API and notification
/// collaborators.
///
/// ### Record Example
/// ```json
/// {
///   "id": "rma-fcb:1X2:Away=betfair,Draw=bet365,Home=pinnacle",
///   "event_id": "rma-fcb",
///   "market_id": "1X2",
///   "profit_percent": 7.91,
///   "arbitrage_index": 0.9208937198067634,
///   "bookmakers": ["pinnacle", "bet365", "betfair"],
///   "stakes": [
///     {"bookmaker": "pinnacle", "outcome": "Home", "odds": 2.3, "amount": "472.13", "percentage": 47.21}
///   ],
///   "detected_at": "2025-03-01T19:00:00Z",
///   "expires_at": "2025-03-01T19:00:30Z",
///   "is_active": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OpportunityRecord {
    pub id: OpportunityId,
    pub event_id: EventId,
    pub market_id: MarketId,
    /// Rounded to 2 decimal places.
    pub profit_percent: f64,
    pub arbitrage_index: f64,
    pub bookmakers: Vec<BookmakerId>,
    pub stakes: Vec<StakeRecord>,
    pub detected_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StakeRecord {
    pub bookmaker: BookmakerId,
    pub outcome: OutcomeName,
    pub odds: f64,
    pub amount: Decimal,
    pub percentage: f64,
}

impl From<&ArbitrageOpportunity> for OpportunityRecord {
    fn from(opportunity: &ArbitrageOpportunity) -> Self {
        Self {
            id: opportunity.id.clone(),
            event_id: opportunity.event_id().clone(),
            market_id: opportunity.market_id().clone(),
            profit_percent: round_2dp(opportunity.profit_percent),
            arbitrage_index: opportunity.arbitrage_index,
            bookmakers: opportunity.bookmakers(),
            stakes: opportunity
                .stakes
                .iter()
                .map(|line| StakeRecord {
                    bookmaker: line.bookmaker_id.clone(),
                    outcome: line.outcome_name.clone(),
                    odds: line.odds,
                    amount: line.amount,
                    percentage: round_2dp(line.percentage),
                })
                .collect(),
            detected_at: opportunity.detected_at,
            expires_at: opportunity.expires_at,
            is_active: opportunity.is_active,
        }
    }
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
