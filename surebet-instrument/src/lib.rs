//! Data model for the surebet detection engine.
//!
//! Feeds publish [`SnapshotRecord`]s: raw, unvalidated odds for one event/market as seen
//! across bookmakers. The engine turns each record into a validated [`OddsSnapshot`] made of
//! [`Selection`]s whose invariants are checked once, at construction.
//!
//! ```text
//! SnapshotRecord { event_id, market_id, selections: [SelectionRecord], observed_at }
//!        |  Selection::new (odds > 1.0, finite)
//!        v
//! OddsSnapshot   { event_id, market_id, selections: [Selection],       observed_at }
//!                  (>= 2 distinct outcomes)
//! ```

/// Identifier newtypes for bookmakers, events, markets and outcomes.
pub mod id;

/// A single bookmaker price on one outcome.
pub mod selection;

/// One event/market as observed across bookmakers.
pub mod snapshot;

pub use id::{BookmakerId, EventId, MarketId, MarketKey, OutcomeName};
pub use selection::{Selection, SelectionError, SelectionRecord};
pub use snapshot::{OddsSnapshot, SnapshotError, SnapshotRecord};
