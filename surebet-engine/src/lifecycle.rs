//! Opportunity lifecycle across detection cycles.
//!
//! ```text
//! DETECTED ──> ACTIVE ──(re-detected)──> REFRESHED ──> ACTIVE
//!                 │
//!                 └──(TTL elapsed | not re-detected)──> EXPIRED
//! ```
//!
//! Only the latest cycle's detections are ever active: an opportunity the newest snapshots no
//! longer show is expired immediately, whatever its `expires_at`.

use crate::opportunity::{ArbitrageOpportunity, Detection, OpportunityId};
use chrono::{DateTime, Duration, Utc};
use derive_more::Display;
use indexmap::{IndexMap, map::Entry};
use parking_lot::RwLock;
use std::cmp::Ordering;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ExpiryReason {
    #[display("ttl")]
    Ttl,
    #[display("not_redetected")]
    NotRedetected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expired {
    /// Final state of the opportunity, with `is_active = false`.
    pub opportunity: ArbitrageOpportunity,
    pub reason: ExpiryReason,
}

/// What one call to [`OpportunityLifecycleManager::reconcile`] changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub activated: Vec<OpportunityId>,
    pub refreshed: Vec<OpportunityId>,
    pub expired: Vec<Expired>,
}

/// Owns the set of active opportunities.
///
/// Writes happen only in [`Self::reconcile`]; readers copy out under a read lock.
#[derive(Debug)]
pub struct OpportunityLifecycleManager {
    ttl: Duration,
    active: RwLock<IndexMap<OpportunityId, ArbitrageOpportunity>>,
}

impl OpportunityLifecycleManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            active: RwLock::new(IndexMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Apply one cycle's detections at `now`.
    ///
    /// 1. Active opportunities past `expires_at` expire (`Ttl`).
    /// 2. Remaining active opportunities absent from `detections` expire (`NotRedetected`).
    /// 3. New ids are activated with `detected_at = now`.
    /// 4. Known ids are refreshed in place, keeping `detected_at`.
    ///
    /// If `detections` holds the same id twice the more profitable one is used.
    pub fn reconcile(&self, detections: Vec<Detection>, now: DateTime<Utc>) -> CycleReport {
        let mut batch: IndexMap<OpportunityId, Detection> = IndexMap::with_capacity(detections.len());
        for detection in detections {
            match batch.entry(detection.id.clone()) {
                Entry::Occupied(mut entry) => {
                    if detection.evaluation.profit_percent > entry.get().evaluation.profit_percent {
                        entry.insert(detection);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(detection);
                }
            }
        }

        let mut report = CycleReport::default();
        let mut active = self.active.write();

        let mut expire = |id: &OpportunityId, opportunity: &mut ArbitrageOpportunity| {
            let reason = if opportunity.is_expired(now) {
                ExpiryReason::Ttl
            } else if !batch.contains_key(id) {
                ExpiryReason::NotRedetected
            } else {
                return true;
            };

            opportunity.is_active = false;
            info!(
                id = %id,
                %reason,
                profit_percent = opportunity.profit_percent,
                "surebet expired"
            );
            report.expired.push(Expired {
                opportunity: opportunity.clone(),
                reason,
            });
            false
        };
        active.retain(|id, opportunity| expire(id, opportunity));

        for (id, detection) in batch {
            match active.get_mut(&id) {
                Some(opportunity) => {
                    opportunity.refresh(detection, now, self.ttl);
                    debug!(
                        id = %id,
                        profit_percent = opportunity.profit_percent,
                        expires_at = %opportunity.expires_at,
                        "surebet refreshed"
                    );
                    report.refreshed.push(id);
                }
                None => {
                    let opportunity = ArbitrageOpportunity::activate(detection, now, self.ttl);
                    info!(
                        id = %id,
                        profit_percent = opportunity.profit_percent,
                        bookmakers = ?opportunity.bookmakers(),
                        "surebet detected"
                    );
                    active.insert(id.clone(), opportunity);
                    report.activated.push(id);
                }
            }
        }

        report
    }

    /// Active opportunities, most profitable first (ties: oldest first, then by id).
    pub fn active_opportunities(&self) -> Vec<ArbitrageOpportunity> {
        let mut opportunities = self.active.read().values().cloned().collect::<Vec<_>>();
        opportunities.sort_by(by_profit_desc);
        opportunities
    }

    /// Active opportunities with `profit_percent >= min_profit_percent`, sorted as
    /// [`Self::active_opportunities`].
    pub fn active_above(&self, min_profit_percent: f64) -> Vec<ArbitrageOpportunity> {
        let mut opportunities = self
            .active
            .read()
            .values()
            .filter(|opportunity| opportunity.profit_percent >= min_profit_percent)
            .cloned()
            .collect::<Vec<_>>();
        opportunities.sort_by(by_profit_desc);
        opportunities
    }

    pub fn get(&self, id: &OpportunityId) -> Option<ArbitrageOpportunity> {
        self.active.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.active.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.read().is_empty()
    }
}

fn by_profit_desc(a: &ArbitrageOpportunity, b: &ArbitrageOpportunity) -> Ordering {
    b.profit_percent
        .total_cmp(&a.profit_percent)
        .then_with(|| a.detected_at.cmp(&b.detected_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cover::OutcomeCover, evaluator::ArbitrageEvaluator};
    use surebet_instrument::Selection;

    fn detection(event: &str, home: f64, away: f64) -> Detection {
        let cover = OutcomeCover::new(
            event,
            "ML",
            vec![
                Selection::new("Home", home, "A").unwrap(),
                Selection::new("Away", away, "B").unwrap(),
            ],
        )
        .unwrap();
        let evaluation = ArbitrageEvaluator::evaluate(&cover).unwrap();
        Detection::new(cover, evaluation, vec![])
    }

    fn manager() -> OpportunityLifecycleManager {
        OpportunityLifecycleManager::new(Duration::seconds(30))
    }

    #[test]
    fn test_new_detection_activated() {
        let manager = manager();
        let now = Utc::now();

        let report = manager.reconcile(vec![detection("e1", 2.1, 2.1)], now);

        assert_eq!(report.activated.len(), 1);
        assert!(report.refreshed.is_empty());
        assert!(report.expired.is_empty());

        let active = manager.active_opportunities();
        assert_eq!(active.len(), 1);
        assert!(active[0].is_active);
        assert_eq!(active[0].detected_at, now);
        assert_eq!(active[0].expires_at, now + Duration::seconds(30));
    }

    #[test]
    fn test_redetection_refreshes_and_keeps_detected_at() {
        let manager = manager();
        let start = Utc::now();
        manager.reconcile(vec![detection("e1", 2.1, 2.1)], start);

        let later = start + Duration::seconds(10);
        let report = manager.reconcile(vec![detection("e1", 2.3, 2.1)], later);

        assert_eq!(report.refreshed.len(), 1);
        assert!(report.activated.is_empty());

        let active = manager.active_opportunities();
        assert_eq!(active[0].detected_at, start);
        assert_eq!(active[0].expires_at, later + Duration::seconds(30));
        let expected = (1.0 - (1.0 / 2.3 + 1.0 / 2.1)) * 100.0;
        assert!((active[0].profit_percent - expected).abs() < 1e-12);
    }

    #[test]
    fn test_absent_opportunity_removed_before_ttl() {
        let manager = manager();
        let start = Utc::now();
        manager.reconcile(vec![detection("e1", 2.1, 2.1), detection("e2", 2.2, 2.2)], start);

        let report = manager.reconcile(vec![detection("e2", 2.2, 2.2)], start + Duration::seconds(1));

        assert_eq!(report.expired.len(), 1);
        assert_eq!(report.expired[0].reason, ExpiryReason::NotRedetected);
        assert!(!report.expired[0].opportunity.is_active);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.active_opportunities()[0].cover.event_id().as_str(), "e2");
    }

    #[test]
    fn test_ttl_expiry_precedes_redetection() {
        let manager = manager();
        let start = Utc::now();
        manager.reconcile(vec![detection("e1", 2.1, 2.1)], start);

        let later = start + Duration::seconds(31);
        let report = manager.reconcile(vec![detection("e1", 2.1, 2.1)], later);

        assert_eq!(report.expired.len(), 1);
        assert_eq!(report.expired[0].reason, ExpiryReason::Ttl);
        assert_eq!(report.activated.len(), 1);
        assert_eq!(manager.active_opportunities()[0].detected_at, later);
    }

    #[test]
    fn test_empty_cycle_expires_everything() {
        let manager = manager();
        let now = Utc::now();
        manager.reconcile(vec![detection("e1", 2.1, 2.1)], now);

        let report = manager.reconcile(vec![], now);
        assert_eq!(report.expired.len(), 1);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_duplicate_ids_keep_most_profitable() {
        let manager = manager();
        let report = manager.reconcile(
            vec![detection("e1", 2.1, 2.1), detection("e1", 2.4, 2.1), detection("e1", 2.2, 2.1)],
            Utc::now(),
        );

        assert_eq!(report.activated.len(), 1);
        let active = manager.active_opportunities();
        assert_eq!(active[0].cover.selections()[0].odds(), 2.4);
    }

    #[test]
    fn test_sorted_by_profit_then_age() {
        let manager = manager();
        let start = Utc::now();
        manager.reconcile(vec![detection("old", 2.2, 2.2)], start);

        let later = start + Duration::seconds(5);
        manager.reconcile(
            vec![
                detection("old", 2.2, 2.2),
                detection("young", 2.2, 2.2),
                detection("best", 2.5, 2.2),
                detection("low", 2.05, 2.05),
            ],
            later,
        );

        let order = manager
            .active_opportunities()
            .into_iter()
            .map(|opportunity| opportunity.cover.event_id().to_string())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["best", "old", "young", "low"]);

        let above = manager.active_above(5.0);
        assert_eq!(above.len(), 3);
        assert!(above.iter().all(|opportunity| opportunity.profit_percent >= 5.0));
    }
}
