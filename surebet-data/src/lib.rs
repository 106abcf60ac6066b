//! Odds feed plumbing for the surebet detection engine.
//!
//! Bookmaker integrations implement [`OddsFeed`] and hand back [`SnapshotRecord`]s carrying
//! their own prices only. The [`SnapshotAssembler`] merges every feed's records into one
//! cross-bookmaker record per `(event_id, market_id)`, which is what the engine consumes.
//!
//! ```text
//! OddsFeed("pinnacle") ─┐
//! OddsFeed("bet365")  ──┼─> SnapshotAssembler ─> [SnapshotRecord] ─> DetectionPipeline
//! OddsFeed("betfair") ──┘
//! ```
//!
//! Fixture matching across bookmakers is not done here: feeds must already publish canonical
//! event and market ids, and identical outcome names.
//!
//! [`SnapshotRecord`]: surebet_instrument::SnapshotRecord

/// Merges per-bookmaker records into cross-bookmaker snapshot records.
pub mod assembler;

/// Feed errors.
pub mod error;

/// The [`OddsFeed`] adapter trait and in-memory / JSON implementations.
pub mod feed;

/// Bookmaker event payloads as published by the bookmaker adapters.
pub mod message;

/// Flattens [`BookmakerEvent`](message::BookmakerEvent) payloads into [`FeedRow`]s.
pub mod transformer;

pub use assembler::SnapshotAssembler;
pub use error::FeedError;
pub use feed::{JsonFeed, OddsFeed, StaticFeed};
pub use message::{BookmakerEvent, BookmakerMarket, BookmakerSelection, EventStatus};
pub use transformer::{EventTransformer, FeedRow};
