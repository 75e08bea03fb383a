//! Shared concurrency tracking for the mocks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts calls in progress across every mock sharing it, and the highest
/// count seen.
///
/// Clones share the same counters, so one tracker handed to both the source
/// builder and the supplementary source measures all stage work together.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a call as started. It ends when the guard is dropped.
    pub fn enter(&self) -> ActivityGuard {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        ActivityGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in progress at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Ends one tracked call on drop, including during a panic.
#[derive(Debug)]
pub struct ActivityGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
