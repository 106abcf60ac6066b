//! Detection cycle orchestration.

use crate::{
    allocator::StakeAllocator,
    clock::{EngineClock, LiveClock},
    config::EngineConfig,
    enumerator::CombinationEnumerator,
    error::{AllocationError, ConfigError, EngineError},
    evaluator::ArbitrageEvaluator,
    lifecycle::{CycleReport, OpportunityLifecycleManager},
    normalise::{Normaliser, Rejection},
    opportunity::{ArbitrageOpportunity, Detection},
};
use fnv::FnvHashSet;
use futures::future::join_all;
use indexmap::{IndexMap, map::Entry};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::{
    future::Future,
    ops::AddAssign,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use surebet_data::{OddsFeed, SnapshotAssembler};
use surebet_instrument::{BookmakerId, EventId, MarketKey, SnapshotRecord};
use tokio::{
    runtime::{Handle, RuntimeFlavor},
    time::MissedTickBehavior,
};
use tokio_stream::{StreamExt, wrappers::IntervalStream};
use tracing::{debug, error, info, warn};

/// Cooperative cancellation for an in-flight cycle, checked before each snapshot.
///
/// Once cancelled the flag stays set, cancelling every later cycle, until [`Self::reset`].
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters describing one completed detection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub snapshots: usize,
    pub skipped: usize,
    pub covers_evaluated: usize,
    pub surebets: usize,
    pub truncations: usize,
    pub allocation_failures: usize,
    pub activated: usize,
    pub refreshed: usize,
    pub expired: usize,
}

impl AddAssign for CycleSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.snapshots += rhs.snapshots;
        self.skipped += rhs.skipped;
        self.covers_evaluated += rhs.covers_evaluated;
        self.surebets += rhs.surebets;
        self.truncations += rhs.truncations;
        self.allocation_failures += rhs.allocation_failures;
        self.activated += rhs.activated;
        self.refreshed += rhs.refreshed;
        self.expired += rhs.expired;
    }
}

impl CycleSummary {
    fn record_report(&mut self, report: &CycleReport) {
        self.activated = report.activated.len();
        self.refreshed = report.refreshed.len();
        self.expired = report.expired.len();
    }
}

/// Per-snapshot output of the parallel stage.
#[derive(Debug, Default)]
struct SnapshotOutcome {
    detections: Vec<Detection>,
    rejected: Vec<Rejection>,
    summary: CycleSummary,
    cancelled: bool,
}

/// Runs detection cycles: normalise, enumerate, evaluate, allocate, reconcile.
///
/// At most one cycle runs at a time; a concurrent call returns
/// [`EngineError::CycleInProgress`] without touching the active set.
pub struct DetectionPipeline<Clock = LiveClock> {
    config: EngineConfig,
    normaliser: Normaliser,
    enumerator: CombinationEnumerator,
    allocator: StakeAllocator,
    lifecycle: OpportunityLifecycleManager,
    feeds: Vec<Arc<dyn OddsFeed>>,
    clock: Clock,
    cancellation: CancellationFlag,
    cycle: Mutex<()>,
    warned: Mutex<FnvHashSet<(BookmakerId, EventId)>>,
    last_summary: RwLock<Option<CycleSummary>>,
}

impl<Clock> std::fmt::Debug for DetectionPipeline<Clock>
where
    Clock: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionPipeline")
            .field("config", &self.config)
            .field(
                "feeds",
                &self.feeds.iter().map(|feed| feed.name()).collect::<Vec<_>>(),
            )
            .field("clock", &self.clock)
            .field("active", &self.lifecycle.len())
            .finish()
    }
}

impl DetectionPipeline<LiveClock> {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, LiveClock)
    }
}

impl<Clock> DetectionPipeline<Clock>
where
    Clock: EngineClock,
{
    /// Build a pipeline reading time from `clock`. Fails if `config` does not validate.
    pub fn with_clock(config: EngineConfig, clock: Clock) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            normaliser: Normaliser::new(config.clone()),
            enumerator: CombinationEnumerator::new(config.enumeration_cap_per_outcome_group),
            allocator: StakeAllocator::new(config.stake_decimal_places),
            lifecycle: OpportunityLifecycleManager::new(config.ttl()),
            feeds: Vec::new(),
            clock,
            cancellation: CancellationFlag::new(),
            cycle: Mutex::new(()),
            warned: Mutex::new(FnvHashSet::default()),
            last_summary: RwLock::new(None),
            config,
        })
    }

    /// Add the feeds polled by [`Self::poll`].
    pub fn with_feeds(mut self, feeds: impl IntoIterator<Item = Arc<dyn OddsFeed>>) -> Self {
        self.feeds.extend(feeds);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &OpportunityLifecycleManager {
        &self.lifecycle
    }

    /// Handle for cancelling in-flight and future cycles.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    pub fn last_summary(&self) -> Option<CycleSummary> {
        *self.last_summary.read()
    }

    /// Active opportunities meeting the configured `min_profit_percent`.
    pub fn active_above_threshold(&self) -> Vec<ArbitrageOpportunity> {
        self.lifecycle.active_above(self.config.min_profit_percent)
    }

    /// Run one detection cycle over `snapshots`, returning the active opportunities afterwards.
    ///
    /// Records sharing an `(event_id, market_id)` key are collapsed to the one with the latest
    /// `observed_at`. Snapshots are processed in parallel; the active set is reconciled once
    /// at the end.
    pub fn run(
        &self,
        snapshots: Vec<SnapshotRecord>,
        total_stake: Decimal,
    ) -> Result<Vec<ArbitrageOpportunity>, EngineError> {
        if total_stake <= Decimal::ZERO {
            return Err(AllocationError::NonPositiveStake(total_stake).into());
        }
        let _cycle = self.cycle.try_lock().ok_or(EngineError::CycleInProgress)?;

        let snapshots = latest_per_key(snapshots);
        let events = snapshots
            .iter()
            .map(|record| record.event_id.clone())
            .collect::<FnvHashSet<_>>();
        let outcomes = snapshots
            .into_par_iter()
            .map(|record| self.process(record, total_stake))
            .collect::<Vec<_>>();

        if self.cancellation.is_cancelled() || outcomes.iter().any(|outcome| outcome.cancelled) {
            warn!("detection cycle cancelled, active set left untouched");
            return Err(EngineError::Cancelled);
        }

        let mut summary = CycleSummary::default();
        let mut detections = Vec::new();
        let mut rejected = Vec::new();
        for outcome in outcomes {
            summary += outcome.summary;
            rejected.extend(outcome.rejected);
            detections.extend(outcome.detections);
        }
        self.report_rejections(rejected, &events);

        let report = self.lifecycle.reconcile(detections, self.clock.time());
        summary.record_report(&report);

        info!(
            snapshots = summary.snapshots,
            skipped = summary.skipped,
            covers = summary.covers_evaluated,
            surebets = summary.surebets,
            truncations = summary.truncations,
            allocation_failures = summary.allocation_failures,
            activated = summary.activated,
            refreshed = summary.refreshed,
            expired = summary.expired,
            active = self.lifecycle.len(),
            "detection cycle complete"
        );
        *self.last_summary.write() = Some(summary);

        Ok(self.lifecycle.active_opportunities())
    }

    /// Fetch every feed concurrently, merge their records and run one cycle.
    ///
    /// Failing feeds are logged and left out of the cycle. On a multi-threaded runtime the
    /// cycle runs inside [`tokio::task::block_in_place`].
    pub async fn poll(&self, total_stake: Decimal) -> Result<Vec<ArbitrageOpportunity>, EngineError> {
        let fetches = self
            .feeds
            .iter()
            .map(|feed| async move { (feed.name(), feed.fetch().await) });

        let mut assembler = SnapshotAssembler::new();
        for (feed, result) in join_all(fetches).await {
            match result {
                Ok(records) => {
                    debug!(%feed, records = records.len(), "fetched odds");
                    assembler.extend_records(records);
                }
                Err(error) => warn!(%feed, %error, "failed to fetch odds, skipping feed"),
            }
        }

        let records = assembler.finish();
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.run(records, total_stake))
            }
            _ => self.run(records, total_stake),
        }
    }

    /// Poll on a fixed `period` until `shutdown` resolves or the cycle is cancelled.
    ///
    /// Missed ticks are skipped rather than bursted. Only a non-positive `total_stake` is
    /// returned as an error.
    pub async fn run_periodic<F>(
        &self,
        period: Duration,
        total_stake: Decimal,
        shutdown: F,
    ) -> Result<(), EngineError>
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = IntervalStream::new(interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, stopping detection");
                    return Ok(());
                }
                tick = ticks.next() => {
                    if tick.is_none() {
                        return Ok(());
                    }

                    match self.poll(total_stake).await {
                        Ok(active) => debug!(active = active.len(), "periodic cycle complete"),
                        Err(EngineError::CycleInProgress) => {
                            warn!("previous detection cycle still running, skipping tick")
                        }
                        Err(EngineError::Cancelled) => {
                            info!("detection cancelled, stopping");
                            return Ok(());
                        }
                        Err(error) => {
                            error!(%error, "detection stopped");
                            return Err(error);
                        }
                    }
                }
            }
        }
    }

    fn process(&self, record: SnapshotRecord, total_stake: Decimal) -> SnapshotOutcome {
        let mut outcome = SnapshotOutcome::default();
        if self.cancellation.is_cancelled() {
            outcome.cancelled = true;
            return outcome;
        }
        outcome.summary.snapshots = 1;

        let normalised = self.normaliser.normalise(record);
        outcome.rejected = normalised.rejected;

        let snapshot = match normalised.snapshot {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "skipping malformed snapshot");
                outcome.summary.skipped = 1;
                return outcome;
            }
        };

        let mut covers = self.enumerator.enumerate(&snapshot);
        for cover in covers.by_ref() {
            outcome.summary.covers_evaluated += 1;

            let Some(evaluation) = ArbitrageEvaluator::evaluate(&cover) else {
                continue;
            };
            if !evaluation.is_surebet {
                continue;
            }
            outcome.summary.surebets += 1;

            let stakes = match self.allocator.allocate(&cover, &evaluation, total_stake) {
                Ok(stakes) => stakes,
                Err(error) => {
                    warn!(
                        event_id = %cover.event_id(),
                        market_id = %cover.market_id(),
                        %error,
                        "cannot allocate stakes, reporting surebet without stakes"
                    );
                    outcome.summary.allocation_failures += 1;
                    Vec::new()
                }
            };

            outcome.detections.push(Detection::new(cover, evaluation, stakes));
        }
        outcome.summary.truncations = covers.truncations().len();

        debug!(
            key = %snapshot.key(),
            selections = snapshot.selections().len(),
            covers = outcome.summary.covers_evaluated,
            surebets = outcome.summary.surebets,
            "processed snapshot"
        );
        outcome
    }

    /// Log invalid selections once per `(bookmaker_id, event_id)`.
    ///
    /// Keys of events absent from this cycle are forgotten, so a returning event warns again.
    fn report_rejections(&self, rejected: Vec<Rejection>, events: &FnvHashSet<EventId>) {
        let mut warned = self.warned.lock();
        warned.retain(|(_, event_id)| events.contains(event_id));

        for rejection in rejected {
            let key = (rejection.bookmaker_id, rejection.event_id);
            if warned.contains(&key) {
                continue;
            }

            warn!(
                bookmaker = %key.0,
                event_id = %key.1,
                outcome = %rejection.outcome_name,
                reason = %rejection.reason,
                "dropping invalid selection"
            );
            warned.insert(key);
        }
    }
}

/// Collapse records sharing a key, keeping the latest `observed_at` (later records win ties).
fn latest_per_key(records: Vec<SnapshotRecord>) -> Vec<SnapshotRecord> {
    let mut latest: IndexMap<MarketKey, SnapshotRecord> = IndexMap::with_capacity(records.len());
    for record in records {
        match latest.entry(record.key()) {
            Entry::Occupied(mut entry) => {
                if record.observed_at >= entry.get().observed_at {
                    entry.insert(record);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
            }
        }
    }
    latest.into_values().collect()
}
