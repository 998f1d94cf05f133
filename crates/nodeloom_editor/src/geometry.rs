// SPDX-License-Identifier: MIT OR Apache-2.0
//! Endpoint offsets reported by the host's rendering layer.
//!
//! While a layout settles the host may report the same anchor many times in
//! quick succession. Reports are held until the endpoint has been quiet for
//! the debounce window, then committed once with the last reported value.

use egui::Vec2;
use indexmap::IndexMap;
use nodeloom_graph::{Endpoint, NodeId};
use std::time::{Duration, Instant};

/// Quiet period before a reported offset is committed
pub const GEOMETRY_DEBOUNCE: Duration = Duration::from_millis(10);

/// Relative pixel offsets of endpoints from their node's origin
#[derive(Debug, Clone)]
pub struct EndpointOffsetCache {
    committed: IndexMap<Endpoint, Vec2>,
    pending: IndexMap<Endpoint, (Vec2, Instant)>,
    window: Duration,
}

impl Default for EndpointOffsetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointOffsetCache {
    /// Create an empty cache with the default debounce window
    pub fn new() -> Self {
        Self::with_window(GEOMETRY_DEBOUNCE)
    }

    /// Create an empty cache with a custom debounce window
    pub fn with_window(window: Duration) -> Self {
        Self {
            committed: IndexMap::new(),
            pending: IndexMap::new(),
            window,
        }
    }

    /// Queue a report. A later report for the same endpoint replaces it and restarts its window.
    pub fn report(&mut self, endpoint: Endpoint, offset: Vec2, now: Instant) {
        self.pending.insert(endpoint, (offset, now));
    }

    /// Commit every report whose endpoint has been quiet for the window.
    ///
    /// Returns how many offsets changed.
    pub fn flush(&mut self, now: Instant) -> usize {
        let window = self.window;
        let mut changed = 0;
        let committed = &mut self.committed;
        self.pending.retain(|endpoint, (offset, reported)| {
            if now.saturating_duration_since(*reported) < window {
                return true;
            }
            if committed.get(endpoint) != Some(&*offset) {
                committed.insert(endpoint.clone(), *offset);
                changed += 1;
            }
            false
        });
        changed
    }

    /// Whether reports are still waiting for their window to pass
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Committed offset of an endpoint
    pub fn get(&self, endpoint: &Endpoint) -> Option<Vec2> {
        self.committed.get(endpoint).copied()
    }

    /// Drop everything known about a node's endpoints
    pub fn forget_node(&mut self, node_id: &NodeId) {
        self.committed.retain(|e, _| &e.node_id != node_id);
        self.pending.retain(|e, _| &e.node_id != node_id);
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.committed.clear();
        self.pending.clear();
    }
}
