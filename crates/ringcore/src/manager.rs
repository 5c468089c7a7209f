//! Snapshot manager.
//!
//! Holds the currently installed ring and hands out `Arc` snapshots.
//! Readers capture a snapshot once per operation; installing a new ring
//! never disturbs operations already holding one.

use crate::ring::RingSnapshot;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Owner of the current ring snapshot.
pub struct RingManager {
    current: RwLock<Arc<RingSnapshot>>,
}

impl RingManager {
    pub fn new(initial: RingSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The currently installed ring.
    pub fn current(&self) -> Arc<RingSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Install a new ring, returning the one it replaced.
    pub fn install(&self, snapshot: RingSnapshot) -> Arc<RingSnapshot> {
        let next = Arc::new(snapshot);
        debug!(
            partitions = next.partition_count(),
            nodes = next.nodes().len(),
            "installing ring snapshot"
        );
        std::mem::replace(&mut *self.current.write(), next)
    }
}
