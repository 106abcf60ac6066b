//! Lazy enumeration of cross-bookmaker [`OutcomeCover`]s.
//!
//! A market with `k` outcome groups of sizes `n_1..n_k` has up to `n_1 * .. * n_k` covers. The
//! [`Covers`] iterator walks that product depth first, abandoning any partial cover as soon as
//! it reuses a bookmaker, so only valid covers are ever built and the full product is never
//! materialised.

use crate::cover::OutcomeCover;
use indexmap::IndexMap;
use itertools::Itertools;
use std::cmp::Ordering;
use surebet_instrument::{EventId, MarketId, OddsSnapshot, OutcomeName, Selection};
use tracing::warn;

/// An outcome group larger than the enumeration cap, and how far it was cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationOverflow {
    pub outcome_name: OutcomeName,
    pub original: usize,
    pub kept: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct CombinationEnumerator {
    cap: usize,
}

impl Default for CombinationEnumerator {
    fn default() -> Self {
        Self::new(12)
    }
}

impl CombinationEnumerator {
    /// `cap` is the maximum number of selections kept per outcome group (at least 1).
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1) }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Lazily enumerate every valid [`OutcomeCover`] of the snapshot.
    ///
    /// Groups larger than the cap are reduced first to the best price per bookmaker, then to
    /// the `cap` highest odds (ties broken by bookmaker id).
    pub fn enumerate(&self, snapshot: &OddsSnapshot) -> Covers {
        let mut grouped: IndexMap<&OutcomeName, Vec<Selection>> = IndexMap::new();
        for selection in snapshot.selections() {
            grouped
                .entry(selection.outcome_name())
                .or_default()
                .push(selection.clone());
        }

        let mut truncations = Vec::new();
        let groups = grouped
            .into_iter()
            .map(|(outcome_name, group)| {
                if group.len() <= self.cap {
                    return group;
                }

                let original = group.len();
                let kept = best_per_bookmaker(group, self.cap);
                warn!(
                    event_id = %snapshot.event_id(),
                    market_id = %snapshot.market_id(),
                    outcome = %outcome_name,
                    original,
                    kept = kept.len(),
                    "outcome group exceeds enumeration cap, truncating"
                );
                truncations.push(EnumerationOverflow {
                    outcome_name: outcome_name.clone(),
                    original,
                    kept: kept.len(),
                });
                kept
            })
            .collect::<Vec<_>>();

        Covers::new(
            snapshot.event_id().clone(),
            snapshot.market_id().clone(),
            groups,
            truncations,
        )
    }
}

fn best_per_bookmaker(group: Vec<Selection>, cap: usize) -> Vec<Selection> {
    let by_odds_desc = |a: &Selection, b: &Selection| -> Ordering {
        b.odds()
            .total_cmp(&a.odds())
            .then_with(|| a.bookmaker_id().cmp(b.bookmaker_id()))
    };

    group
        .into_iter()
        .sorted_by(by_odds_desc)
        .unique_by(|selection| selection.bookmaker_id().clone())
        .take(cap)
        .collect()
}

/// Iterator over the valid covers of one snapshot, see [`CombinationEnumerator::enumerate`].
///
/// Cloning yields an independent iterator from the same position; [`Covers::restart`] rewinds
/// to the first cover.
#[derive(Debug, Clone)]
pub struct Covers {
    event_id: EventId,
    market_id: MarketId,
    groups: Vec<Vec<Selection>>,
    truncations: Vec<EnumerationOverflow>,
    /// Index of the chosen selection in each group, for groups `0..path.len()`.
    path: Vec<usize>,
    /// Next candidate index to try in group `path.len()`.
    next: usize,
    exhausted: bool,
}

impl Covers {
    fn new(
        event_id: EventId,
        market_id: MarketId,
        groups: Vec<Vec<Selection>>,
        truncations: Vec<EnumerationOverflow>,
    ) -> Self {
        let exhausted = groups.len() < 2;
        Self {
            event_id,
            market_id,
            path: Vec::with_capacity(groups.len()),
            groups,
            truncations,
            next: 0,
            exhausted,
        }
    }

    /// Outcome groups that were truncated to the cap.
    pub fn truncations(&self) -> &[EnumerationOverflow] {
        &self.truncations
    }

    /// Number of outcome groups, ie/ the size of every yielded cover.
    pub fn outcomes(&self) -> usize {
        self.groups.len()
    }

    pub fn restart(&mut self) {
        self.path.clear();
        self.next = 0;
        self.exhausted = self.groups.len() < 2;
    }

    fn bookmaker_taken(&self, candidate: &Selection) -> bool {
        self.path
            .iter()
            .enumerate()
            .any(|(group, &index)| self.groups[group][index].bookmaker_id() == candidate.bookmaker_id())
    }

    fn current_cover(&self) -> OutcomeCover {
        let selections = self
            .path
            .iter()
            .enumerate()
            .map(|(group, &index)| self.groups[group][index].clone())
            .collect();

        OutcomeCover::from_parts(self.event_id.clone(), self.market_id.clone(), selections)
    }

    fn backtrack(&mut self) {
        match self.path.pop() {
            Some(index) => self.next = index + 1,
            None => self.exhausted = true,
        }
    }
}

impl Iterator for Covers {
    type Item = OutcomeCover;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            let depth = self.path.len();

            if depth == self.groups.len() {
                let cover = self.current_cover();
                self.backtrack();
                return Some(cover);
            }

            let candidate = (self.next..self.groups[depth].len())
                .find(|&index| !self.bookmaker_taken(&self.groups[depth][index]));

            match candidate {
                Some(index) => {
                    self.path.push(index);
                    self.next = 0;
                }
                None => self.backtrack(),
            }
        }

        None
    }
}
