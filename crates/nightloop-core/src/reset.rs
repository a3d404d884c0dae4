//! Reset registry: the set of objects restored at every loop start.
//!
//! The registry never owns the objects it lists. It stores handles (ECS
//! entity ids in the engine) and the caller resolves each handle while
//! broadcasting. Registration and deregistration both happen in the
//! spawn/despawn helpers, so a despawned object is never restored.

use std::fmt::Debug;

use tracing::{debug, warn};

/// Anything that can snap back to its loop-start state.
pub trait Resettable {
    fn reset_state(&mut self);
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReport<H> {
    /// Handles that resolved and were restored.
    pub restored: usize,
    /// Handles that resolved to nothing and were skipped.
    pub stale: Vec<H>,
}

/// Ordered, duplicate-free list of resettable handles.
#[derive(Debug, Clone)]
pub struct ResetRegistry<H> {
    entries: Vec<H>,
}

impl<H> Default for ResetRegistry<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H: Copy + Eq + Debug> ResetRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle. Returns false if it was already registered.
    pub fn register(&mut self, handle: H) -> bool {
        if self.entries.contains(&handle) {
            return false;
        }
        self.entries.push(handle);
        true
    }

    /// Remove a handle. Returns false if it was not registered.
    pub fn unregister(&mut self, handle: H) -> bool {
        match self.entries.iter().position(|h| *h == handle) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, handle: H) -> bool {
        self.entries.contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles in registration order.
    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.entries.iter().copied()
    }

    /// Call `restore` for every handle in registration order.
    ///
    /// `restore` returns false when the handle no longer resolves; such
    /// handles are skipped and reported. The registry cannot change while a
    /// broadcast is running.
    pub fn broadcast_reset(&self, mut restore: impl FnMut(H) -> bool) -> ResetReport<H> {
        let mut report = ResetReport {
            restored: 0,
            stale: Vec::new(),
        };

        for handle in self.handles() {
            if restore(handle) {
                report.restored += 1;
            } else {
                warn!(?handle, "reset broadcast skipped a stale handle");
                report.stale.push(handle);
            }
        }

        debug!(
            restored = report.restored,
            stale = report.stale.len(),
            "reset broadcast complete"
        );
        report
    }
}
