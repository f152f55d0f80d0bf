//! Concurrent statistics aggregation.
//!
//! Every observed I/O event is absorbed into a mergeable accumulator keyed
//! by its filtered stack signature. Accumulators never block: each counter
//! update is an independent atomic add, and the registry is a sharded
//! concurrent map, so any number of I/O threads can report concurrently
//! with the periodic reporting cycle.

pub mod io_detail;

pub use io_detail::{IoDetailAdder, IoSnapshot};

use std::sync::Arc;

use dashmap::DashMap;
use sockhound_common::{IoDetail, Stack, StackFrame};

use crate::domain::errors::StatsParseError;

/// Capability contract for a mergeable statistics accumulator.
///
/// Implementations absorb raw events, fold sibling accumulators of the same
/// kind (e.g. per-shard partials), and round-trip through a single-line
/// text form. Additional event kinds implement this trait as siblings of
/// [`IoDetailAdder`]; there is no inheritance beyond the contract.
pub trait StatisticAdder: Send + Sync {
    /// The raw event type this accumulator absorbs.
    type Event;

    /// Absorb one raw event. Never fails and never blocks.
    fn add(&self, event: &Self::Event);

    /// Fold another accumulator of the same kind into this one.
    fn merge(&self, other: &Self);

    /// Render the current totals as a single-line record.
    fn to_line(&self) -> String;

    /// Reset this accumulator to exactly the state described by a record
    /// line previously produced by [`StatisticAdder::to_line`].
    ///
    /// # Errors
    ///
    /// [`StatsParseError`] when the line does not match the record grammar.
    fn set_from_line(&self, line: &str) -> Result<(), StatsParseError>;
}

/// Shared mapping from filtered stack signature to its accumulator.
///
/// Explicitly owned, lifecycle-scoped state: construct one per probe
/// instance (or per test) and share it behind an `Arc`. `record` is safe
/// under arbitrary concurrent invocation.
#[derive(Debug, Default)]
pub struct IoStatsRegistry {
    adders: DashMap<Stack, Arc<IoDetailAdder>>,
}

impl IoStatsRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one event under its stack signature, creating the
    /// accumulator on first sight of the key.
    pub fn record(&self, signature: Stack, event: &IoDetail) {
        let adder = {
            let entry = self.adders.entry(signature).or_default();
            Arc::clone(entry.value())
        };
        adder.add(event);
    }

    /// Fold a sibling accumulator into the one registered under
    /// `signature`, creating it if absent. Used to absorb per-shard
    /// partials.
    pub fn merge(&self, signature: Stack, other: &IoDetailAdder) {
        let adder = {
            let entry = self.adders.entry(signature).or_default();
            Arc::clone(entry.value())
        };
        adder.merge(other);
    }

    /// The accumulator for a signature, if one exists.
    #[must_use]
    pub fn get(&self, signature: &[StackFrame]) -> Option<Arc<IoDetailAdder>> {
        self.adders.get(signature).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of distinct signatures seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adders.is_empty()
    }

    /// Current (signature, accumulator) pairs. Accumulators keep absorbing
    /// events after the snapshot is taken.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(Stack, Arc<IoDetailAdder>)> {
        self.adders
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Remove and return every entry, leaving the registry empty for the
    /// next reporting interval. Events recorded concurrently land either in
    /// the drained accumulators or in freshly created ones - never lost.
    pub fn drain(&self) -> Vec<(Stack, Arc<IoDetailAdder>)> {
        let keys: Vec<Stack> = self.adders.iter().map(|entry| entry.key().clone()).collect();
        keys.into_iter().filter_map(|key| self.adders.remove(&key)).collect()
    }
}
