use crate::message::{BookmakerEvent, EventStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surebet_instrument::{
    BookmakerId, EventId, MarketId, MarketKey, OutcomeName, SelectionRecord, SnapshotRecord,
};
use tracing::debug;

/// One flat bookmaker price: the smallest unit a feed publishes.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct FeedRow {
    pub event_id: EventId,
    pub market_id: MarketId,
    pub outcome_name: OutcomeName,
    pub odds: f64,
    pub bookmaker_id: BookmakerId,
    pub observed_at: DateTime<Utc>,
}

impl FeedRow {
    pub fn key(&self) -> MarketKey {
        MarketKey::new(self.event_id.clone(), self.market_id.clone())
    }

    pub fn selection(&self) -> SelectionRecord {
        SelectionRecord::new(
            self.outcome_name.clone(),
            self.odds,
            self.bookmaker_id.clone(),
        )
    }
}

/// Flattens [`BookmakerEvent`] payloads into [`FeedRow`]s and per-bookmaker [`SnapshotRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventTransformer {
    /// Drop in-play events (some bookmakers suspend or delay live prices).
    skip_live: bool,
}

impl EventTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_live(mut self, skip_live: bool) -> Self {
        self.skip_live = skip_live;
        self
    }

    /// Flatten one event into rows, stamped with the time the payload was received.
    pub fn rows(&self, event: &BookmakerEvent, received_at: DateTime<Utc>) -> Vec<FeedRow> {
        if self.skip_live && event.status == Some(EventStatus::Live) {
            debug!(
                event_id = %event.id,
                bookmaker = %event.bookmaker,
                "skipping live event"
            );
            return vec![];
        }

        event
            .markets
            .iter()
            .flat_map(|market| {
                market.selections.iter().map(move |selection| FeedRow {
                    event_id: event.id.clone(),
                    market_id: market.kind.clone(),
                    outcome_name: selection.name.clone(),
                    odds: selection.odds,
                    bookmaker_id: event.bookmaker.clone(),
                    observed_at: received_at,
                })
            })
            .collect()
    }

    /// One [`SnapshotRecord`] per market of the event, holding this bookmaker's prices only.
    pub fn records(
        &self,
        event: &BookmakerEvent,
        received_at: DateTime<Utc>,
    ) -> Vec<SnapshotRecord> {
        if self.skip_live && event.status == Some(EventStatus::Live) {
            return vec![];
        }

        event
            .markets
            .iter()
            .filter(|market| !market.selections.is_empty())
            .map(|market| {
                let selections = market
                    .selections
                    .iter()
                    .map(|selection| {
                        SelectionRecord::new(
                            selection.name.clone(),
                            selection.odds,
                            event.bookmaker.clone(),
                        )
                    })
                    .collect();

                SnapshotRecord::new(
                    event.id.clone(),
                    market.kind.clone(),
                    selections,
                    received_at,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{BookmakerMarket, BookmakerSelection};

    fn event(status: Option<EventStatus>) -> BookmakerEvent {
        BookmakerEvent {
            id: EventId::from("rma-fcb"),
            name: Some("Real Madrid vs Barcelona".to_string()),
            sport: Some("soccer".to_string()),
            status,
            start_time: None,
            bookmaker: BookmakerId::from("pinnacle"),
            markets: vec![
                BookmakerMarket {
                    kind: MarketId::from("1X2"),
                    name: None,
                    selections: vec![
                        BookmakerSelection { name: OutcomeName::from("Home"), odds: 2.10 },
                        BookmakerSelection { name: OutcomeName::from("Draw"), odds: 3.40 },
                        BookmakerSelection { name: OutcomeName::from("Away"), odds: 4.20 },
                    ],
                },
                BookmakerMarket {
                    kind: MarketId::from("OU2.5"),
                    name: None,
                    selections: vec![
                        BookmakerSelection { name: OutcomeName::from("Over 2.5"), odds: 1.90 },
                    ],
                },
                BookmakerMarket {
                    kind: MarketId::from("DC"),
                    name: None,
                    selections: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_rows_flatten_all_markets() {
        let now = Utc::now();
        let rows = EventTransformer::new().rows(&event(Some(EventStatus::Upcoming)), now);

        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.bookmaker_id.as_str() == "pinnacle"));
        assert!(rows.iter().all(|row| row.observed_at == now));
        assert_eq!(rows[3].key().to_string(), "rma-fcb/OU2.5");
    }

    #[test]
    fn test_records_one_per_non_empty_market() {
        let records = EventTransformer::new().records(&event(None), Utc::now());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].market_id.as_str(), "1X2");
        assert_eq!(records[0].selections.len(), 3);
        assert_eq!(records[1].selections.len(), 1);
    }

    #[test]
    fn test_skip_live() {
        let transformer = EventTransformer::new().with_skip_live(true);
        let now = Utc::now();

        assert!(transformer.rows(&event(Some(EventStatus::Live)), now).is_empty());
        assert!(transformer.records(&event(Some(EventStatus::Live)), now).is_empty());
        assert_eq!(transformer.rows(&event(Some(EventStatus::Upcoming)), now).len(), 4);
    }
}
