//! Surebet Detection and Stake Allocation Engine
//!
//! Finds combinations of bookmaker odds on the same event/market whose implied probabilities
//! sum to less than one, splits a total stake across them so every outcome pays the same, and
//! tracks the resulting opportunities across detection cycles.
//!
//! # Architecture
//!
//! ```text
//! [OddsFeed] ─> SnapshotAssembler ─> SnapshotRecord
//!                                         │
//!                      Normaliser ────────┘  (net odds, bounds, ≥2 outcomes)
//!                          │
//!               CombinationEnumerator        (lazy, one bookmaker per cover)
//!                          │
//!               ArbitrageEvaluator           (Σ 1/odds < 1 ?)
//!                          │
//!                 StakeAllocator             (equal payout, exact rounding)
//!                          │
//!          OpportunityLifecycleManager       (activate / refresh / expire)
//!                          │
//!              [ArbitrageOpportunity] ─> OpportunityRecord
//! ```
//!
//! # Key Components
//!
//! - [`DetectionPipeline`]: runs a cycle over snapshots, or polls injected feeds
//! - [`CombinationEnumerator`]: lazily yields valid [`OutcomeCover`]s
//! - [`ArbitrageEvaluator`]: arbitrage index and profit percentage of a cover
//! - [`StakeAllocator`]: per-line stakes rounded to the currency unit
//! - [`OpportunityLifecycleManager`]: the persistent active set
//! - [`EngineConfig`]: TTL, enumeration cap, odds bounds and bookmaker commission
//!
//! # Example
//!
//! ```rust,ignore
//! use surebet_engine::{DetectionPipeline, EngineConfig};
//! use surebet_instrument::{SelectionRecord, SnapshotRecord};
//! use rust_decimal_macros::dec;
//!
//! let pipeline = DetectionPipeline::new(EngineConfig::default())?;
//!
//! let snapshot = SnapshotRecord::new(
//!     "rma-fcb",
//!     "1X2",
//!     vec![
//!         SelectionRecord::new("Home", 2.30, "pinnacle"),
//!         SelectionRecord::new("Draw", 3.60, "bet365"),
//!         SelectionRecord::new("Away", 4.80, "betfair"),
//!     ],
//!     chrono::Utc::now(),
//! );
//!
//! // One surebet at ~7.91%, stakes 472.13 / 301.64 / 226.23
//! let active = pipeline.run(vec![snapshot], dec!(1000))?;
//! ```

/// Stake allocation across the lines of a surebet.
pub mod allocator;

/// Engine clocks.
pub mod clock;

/// Exchange commission on winnings.
pub mod commission;

pub mod config;

/// Validated one-selection-per-outcome combinations.
pub mod cover;

/// Lazy cover enumeration with a per-outcome cap.
pub mod enumerator;

pub mod error;

/// Arbitrage index evaluation.
pub mod evaluator;

pub mod lifecycle;

/// Raw record validation and net odds conversion.
pub mod normalise;

pub mod opportunity;

/// Detection cycle orchestration and feed polling.
pub mod pipeline;

pub use allocator::StakeAllocator;
pub use clock::{EngineClock, HistoricalClock, LiveClock};
pub use commission::CommissionCalculator;
pub use config::{BookmakerOverrides, EngineConfig, OddsBounds};
pub use cover::{CoverError, OutcomeCover};
pub use enumerator::{CombinationEnumerator, Covers, EnumerationOverflow};
pub use error::{AllocationError, ConfigError, EngineError};
pub use evaluator::{ArbitrageEvaluator, Evaluation};
pub use lifecycle::{CycleReport, Expired, ExpiryReason, OpportunityLifecycleManager};
pub use normalise::{NormalisedSnapshot, Normaliser, Rejection, RejectionReason};
pub use opportunity::{
    ArbitrageOpportunity, Detection, OpportunityId, OpportunityRecord, StakeLine, StakeRecord,
};
pub use pipeline::{CancellationFlag, CycleSummary, DetectionPipeline};
