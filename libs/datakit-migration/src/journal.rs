use std::collections::VecDeque;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::{Implementation, RoutingDecision};

/// Per-operation routing counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoutingTally {
    /// Calls served by the new implementation.
    pub new: u64,
    /// Calls served by legacy, fallbacks included.
    pub legacy: u64,
    pub fallbacks: u64,
}

impl RoutingTally {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.new + self.legacy
    }
}

/// Recent routing decisions plus running tallies per operation name.
///
/// The recent buffer keeps the last `capacity` decisions; tallies are
/// never evicted.
#[derive(Debug)]
pub struct RoutingJournal {
    capacity: usize,
    recent: Mutex<VecDeque<RoutingDecision>>,
    tallies: DashMap<String, RoutingTally>,
}

impl Default for RoutingJournal {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl RoutingJournal {
    pub const DEFAULT_CAPACITY: usize = 256;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recent: Mutex::new(VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY))),
            tallies: DashMap::new(),
        }
    }

    pub fn record(&self, decision: &RoutingDecision) {
        {
            let mut tally = self
                .tallies
                .entry(decision.operation_name.clone())
                .or_default();
            match decision.implementation {
                Implementation::New => tally.new += 1,
                Implementation::Legacy => tally.legacy += 1,
            }
            if decision.fell_back {
                tally.fallbacks += 1;
            }
        }

        if self.capacity == 0 {
            return;
        }
        let mut recent = self.recent.lock();
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back(decision.clone());
    }

    /// Oldest first.
    #[must_use]
    pub fn recent(&self) -> Vec<RoutingDecision> {
        self.recent.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn tally(&self, operation: &str) -> RoutingTally {
        self.tallies.get(operation).map_or_else(RoutingTally::default, |t| *t)
    }

    /// All tallies sorted by operation name.
    #[must_use]
    pub fn tallies(&self) -> Vec<(String, RoutingTally)> {
        let mut all: Vec<_> = self
            .tallies
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Operations that have seen traffic and never needed legacy.
    #[must_use]
    pub fn retirement_candidates(&self) -> Vec<String> {
        self.tallies()
            .into_iter()
            .filter(|(_, t)| t.new > 0 && t.legacy == 0)
            .map(|(op, _)| op)
            .collect()
    }

    pub fn clear(&self) {
        self.recent.lock().clear();
        self.tallies.clear();
    }
}
