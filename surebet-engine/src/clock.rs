use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// Source of "now" for opportunity timestamps and expiry.
pub trait EngineClock: Send + Sync {
    fn time(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveClock;

impl EngineClock for LiveClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for replaying recorded snapshots and for tests.
///
/// Clones share the same instant, so a handle kept outside the pipeline can advance time.
#[derive(Debug, Clone)]
pub struct HistoricalClock {
    time: Arc<RwLock<DateTime<Utc>>>,
}

impl HistoricalClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(RwLock::new(time)),
        }
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.time.write() = time;
    }

    pub fn advance(&self, by: Duration) {
        let mut time = self.time.write();
        *time += by;
    }
}

impl EngineClock for HistoricalClock {
    fn time(&self) -> DateTime<Utc> {
        *self.time.read()
    }
}
