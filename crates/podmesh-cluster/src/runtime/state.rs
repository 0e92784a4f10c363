//! Reconciler state: pure logic, no async, no network.
//!
//! Holds the known peer set and turns a discovery result into effects.
//! The set changes only through [`ReconcilerState::commit`], by full
//! replacement.

use crate::types::{PeerId, PeerSet};

use super::effect::ReconcileEffect;

/// Difference between the known set and a discovery result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerDiff {
    /// In the discovery result but not known yet.
    pub added: Vec<PeerId>,
    /// Known but absent from the discovery result.
    pub removed: Vec<PeerId>,
}

impl PeerDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// `added = discovered − current`, `removed = current − discovered`.
pub fn diff(current: &PeerSet, discovered: &PeerSet) -> PeerDiff {
    PeerDiff {
        added: discovered.difference(current).cloned().collect(),
        removed: current.difference(discovered).cloned().collect(),
    }
}

/// The reconciler's belief about which peers currently exist.
#[derive(Debug, Default)]
pub struct ReconcilerState {
    current: PeerSet,
    ticks: u64,
}

impl ReconcilerState {
    /// Start with no known peers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn known(&self) -> &PeerSet {
        &self.current
    }

    /// Number of committed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Diff against `discovered` and plan the effects, removals first.
    pub fn plan(&self, discovered: &PeerSet) -> (PeerDiff, Vec<ReconcileEffect>) {
        let diff = diff(&self.current, discovered);
        let effects = diff
            .removed
            .iter()
            .cloned()
            .map(ReconcileEffect::ObserveRemoved)
            .chain(diff.added.iter().cloned().map(ReconcileEffect::Connect))
            .collect();
        (diff, effects)
    }

    /// Replace the known set with the latest discovery result.
    pub fn commit(&mut self, discovered: PeerSet) {
        self.current = discovered;
        self.ticks += 1;
    }
}
