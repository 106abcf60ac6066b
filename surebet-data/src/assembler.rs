use crate::transformer::FeedRow;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use surebet_instrument::{BookmakerId, MarketKey, OutcomeName, SelectionRecord, SnapshotRecord};

/// Latest price quoted by one bookmaker on one outcome.
#[derive(Debug, Clone, Copy)]
struct Quote {
    odds: f64,
    observed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MarketBucket {
    observed_at: Option<DateTime<Utc>>,
    quotes: IndexMap<(OutcomeName, BookmakerId), Quote>,
}

impl MarketBucket {
    fn upsert(
        &mut self,
        outcome_name: OutcomeName,
        bookmaker_id: BookmakerId,
        odds: f64,
        observed_at: DateTime<Utc>,
    ) {
        let quote = Quote { odds, observed_at };
        self.quotes
            .entry((outcome_name, bookmaker_id))
            .and_modify(|existing| {
                if observed_at >= existing.observed_at {
                    *existing = quote;
                }
            })
            .or_insert(quote);

        self.observed_at = Some(match self.observed_at {
            Some(current) => current.max(observed_at),
            None => observed_at,
        });
    }
}

/// Merges per-bookmaker feed output into one cross-bookmaker [`SnapshotRecord`] per
/// [`MarketKey`].
///
/// When a bookmaker quotes the same outcome more than once, the most recently observed price
/// is kept. The merged record is stamped with the latest observation time of any of its quotes.
/// Markets and selections keep their first-seen order so output is deterministic.
#[derive(Debug, Default)]
pub struct SnapshotAssembler {
    markets: IndexMap<MarketKey, MarketBucket>,
}

impl SnapshotAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, row: FeedRow) {
        let key = row.key();
        self.markets.entry(key).or_default().upsert(
            row.outcome_name,
            row.bookmaker_id,
            row.odds,
            row.observed_at,
        );
    }

    pub fn push_record(&mut self, record: SnapshotRecord) {
        let key = record.key();
        let bucket = self.markets.entry(key).or_default();
        for selection in record.selections {
            bucket.upsert(
                selection.outcome_name,
                selection.bookmaker_id,
                selection.odds,
                record.observed_at,
            );
        }
    }

    pub fn extend_rows(&mut self, rows: impl IntoIterator<Item = FeedRow>) {
        rows.into_iter().for_each(|row| self.push_row(row));
    }

    pub fn extend_records(&mut self, records: impl IntoIterator<Item = SnapshotRecord>) {
        records
            .into_iter()
            .for_each(|record| self.push_record(record));
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Consume the assembler, yielding one merged record per market.
    pub fn finish(self) -> Vec<SnapshotRecord> {
        self.markets
            .into_iter()
            .filter_map(|(key, bucket)| {
                let observed_at = bucket.observed_at?;
                let selections = bucket
                    .quotes
                    .into_iter()
                    .map(|((outcome_name, bookmaker_id), quote)| {
                        SelectionRecord::new(outcome_name, quote.odds, bookmaker_id)
                    })
                    .collect();

                Some(SnapshotRecord {
                    event_id: key.event_id,
                    market_id: key.market_id,
                    selections,
                    observed_at,
                })
            })
            .collect()
    }
}
