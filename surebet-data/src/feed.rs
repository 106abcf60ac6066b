use crate::{
    assembler::SnapshotAssembler, error::FeedError, message::BookmakerEvent,
    transformer::EventTransformer,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use smol_str::SmolStr;
use std::path::PathBuf;
use surebet_instrument::SnapshotRecord;
use tracing::debug;

/// Source of bookmaker odds.
///
/// Implementations do their own I/O (HTTP clients, scrapers, file drops) and hand back
/// records keyed by canonical `(event_id, market_id)`. A record may hold a single
/// bookmaker's prices; the pipeline merges every feed's output before detection.
#[async_trait]
pub trait OddsFeed: Send + Sync {
    /// Human readable feed name used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<SnapshotRecord>, FeedError>;
}

/// In-memory feed serving a fixed set of records, replaceable between cycles.
#[derive(Debug)]
pub struct StaticFeed {
    name: SmolStr,
    records: RwLock<Vec<SnapshotRecord>>,
}

impl StaticFeed {
    pub fn new(name: impl Into<SmolStr>, records: Vec<SnapshotRecord>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(records),
        }
    }

    /// Replace the records served by subsequent fetches.
    pub fn replace(&self, records: Vec<SnapshotRecord>) {
        *self.records.write() = records;
    }
}

#[async_trait]
impl OddsFeed for StaticFeed {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    async fn fetch(&self) -> Result<Vec<SnapshotRecord>, FeedError> {
        Ok(self.records.read().clone())
    }
}

/// Feed reading a JSON array of [`BookmakerEvent`]s from disk, eg/ the dump an external
/// scraper writes every refresh.
#[derive(Debug, Clone)]
pub struct JsonFeed {
    name: SmolStr,
    path: PathBuf,
    transformer: EventTransformer,
}

impl JsonFeed {
    pub fn new(name: impl Into<SmolStr>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            transformer: EventTransformer::new(),
        }
    }

    pub fn with_transformer(mut self, transformer: EventTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    /// Decode a JSON document of bookmaker events into merged records.
    pub fn decode(&self, json: &str) -> Result<Vec<SnapshotRecord>, FeedError> {
        let events: Vec<BookmakerEvent> = serde_json::from_str(json)?;
        let received_at = Utc::now();

        let mut assembler = SnapshotAssembler::new();
        for event in &events {
            assembler.extend_rows(self.transformer.rows(event, received_at));
        }

        let records = assembler.finish();
        debug!(
            feed = %self.name,
            events = events.len(),
            markets = records.len(),
            "decoded bookmaker events"
        );
        Ok(records)
    }
}

#[async_trait]
impl OddsFeed for JsonFeed {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    async fn fetch(&self) -> Result<Vec<SnapshotRecord>, FeedError> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        self.decode(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surebet_instrument::SelectionRecord;

    #[tokio::test]
    async fn test_static_feed_replace() {
        let feed = StaticFeed::new("fixture", vec![]);
        assert!(feed.fetch().await.unwrap().is_empty());

        feed.replace(vec![SnapshotRecord::new(
            "evt",
            "1X2",
            vec![SelectionRecord::new("Home", 2.0, "pinnacle")],
            Utc::now(),
        )]);

        let records = feed.fetch().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(feed.name(), "fixture");
    }

    #[test]
    fn test_json_feed_decode_merges_bookmakers() {
        let json = r#"
        [
            {"id": "evt", "bookmaker": "pinnacle", "markets": [
                {"type": "1X2", "selections": [{"name": "Home", "odds": 2.10}]}
            ]},
            {"id": "evt", "bookmaker": "bet365", "markets": [
                {"type": "1X2", "selections": [{"name": "Draw", "odds": "3.40"}]}
            ]}
        ]
        "#;

        let records = JsonFeed::new("dump", "unused.json").decode(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].selections.len(), 2);
    }

    #[test]
    fn test_json_feed_decode_error() {
        let result = JsonFeed::new("dump", "unused.json").decode("{not json");
        assert!(matches!(result, Err(FeedError::Decode(_))));
    }
}
