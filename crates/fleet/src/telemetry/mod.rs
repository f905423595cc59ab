use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use common::ring_buffer::RingBuffer;

use crate::{
    constants::DEPOSIT_HISTORY_LENGTH,
    world::{NodeId, Tick},
};

// ----------------------------------------------
// DepositRecord
// ----------------------------------------------

// One completed deposit round trip.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub elapsed: Tick,
    pub amount: u32,

    // Move segments per harvest segment of the unit that made the trip.
    pub config_ratio: f64,
}

pub type DepositHistory = RingBuffer<DepositRecord, DEPOSIT_HISTORY_LENGTH>;

// (deposit time, config ratio) pair fed to the curve fitter.
pub type Sample = (f64, f64);
pub type Samples = SmallVec<[Sample; DEPOSIT_HISTORY_LENGTH]>;

// ----------------------------------------------
// TelemetryStore
// ----------------------------------------------

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TelemetryStore {
    nodes: BTreeMap<NodeId, DepositHistory>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns the record evicted to make room, if the history was full.
    pub fn record(&mut self, node: NodeId, record: DepositRecord) -> Option<DepositRecord> {
        self.nodes.entry(node).or_default().push(record)
    }

    // Newest first.
    pub fn history(&self, node: NodeId) -> impl Iterator<Item = &DepositRecord> {
        self.nodes.get(&node).into_iter().flat_map(|history| history.iter())
    }

    #[inline]
    pub fn len(&self, node: NodeId) -> usize {
        self.nodes.get(&node).map_or(0, |history| history.len())
    }

    #[inline]
    pub fn is_empty(&self, node: NodeId) -> bool {
        self.len(node) == 0
    }

    // Mean elapsed time of the node's history, `None` when there is none.
    pub fn average_deposit_time(&self, node: NodeId) -> Option<f64> {
        let history = self.nodes.get(&node)?;
        if history.is_empty() {
            return None;
        }

        let total: f64 = history.iter().map(|record| record.elapsed as f64).sum();
        Some(total / history.len() as f64)
    }

    pub fn samples(&self, node: NodeId) -> Samples {
        self.history(node)
            .map(|record| (record.elapsed as f64, record.config_ratio))
            .collect()
    }

    // Drops history of nodes for which `keep` returns false.
    pub fn retain_nodes<F>(&mut self, mut keep: F)
        where F: FnMut(NodeId) -> bool
    {
        self.nodes.retain(|node, _| keep(*node));
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests;
