use smol_str::SmolStr;
use thiserror::Error;

/// Errors produced while fetching or decoding odds from a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to decode feed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read feed source: {0}")]
    Io(#[from] std::io::Error),

    #[error("feed {feed} unavailable: {reason}")]
    Unavailable { feed: SmolStr, reason: String },
}
