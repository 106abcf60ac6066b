use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced while splitting a total stake across the lines of a cover.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    #[error("total stake must be positive, got {0}")]
    NonPositiveStake(Decimal),

    #[error("cannot allocate {total_stake} over {lines} lines in units of {unit}: {reason}")]
    Precision {
        total_stake: Decimal,
        lines: usize,
        unit: Decimal,
        reason: &'static str,
    },

    #[error("{0} decimal places exceed the supported stake precision")]
    UnsupportedScale(u32),
}

/// Invalid [`EngineConfig`](crate::config::EngineConfig) values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse {key}={value}")]
    Parse { key: &'static str, value: String },

    #[error("failed to decode bookmaker overrides: {0}")]
    Bookmakers(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced to callers of the [`DetectionPipeline`](crate::pipeline::DetectionPipeline).
///
/// Data faults (bad selections, degenerate snapshots, precision issues) never reach this type;
/// they are logged and the cycle continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("allocation: {0}")]
    Allocation(#[from] AllocationError),

    #[error("a detection cycle is already in progress")]
    CycleInProgress,

    #[error("detection cycle cancelled")]
    Cancelled,
}
