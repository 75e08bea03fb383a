//! Primary and secondary job queues under one in-flight cap.

use std::collections::VecDeque;

use super::job::BuildJob;
use super::types::Stage;

/// Two FIFO queues sharing a single in-flight counter.
///
/// Owned by the dispatcher task; nothing else touches it.
#[derive(Debug)]
pub(crate) struct JobQueue {
    primary: VecDeque<BuildJob>,
    secondary: VecDeque<BuildJob>,
    in_flight: usize,
    capacity: usize,
}

impl JobQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            primary: VecDeque::new(),
            secondary: VecDeque::new(),
            in_flight: 0,
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn push_primary(&mut self, job: BuildJob) {
        self.primary.push_back(job);
    }

    pub(crate) fn push_secondary(&mut self, job: BuildJob) {
        self.secondary.push_back(job);
    }

    /// Takes the next job to dispatch, counting it as in flight.
    ///
    /// Primary work goes first. Returns `None` at the cap or when both
    /// queues are empty.
    pub(crate) fn next_job(&mut self) -> Option<(Stage, BuildJob)> {
        if self.in_flight >= self.capacity {
            return None;
        }

        let next = self
            .primary
            .pop_front()
            .map(|job| (Stage::Primary, job))
            .or_else(|| self.secondary.pop_front().map(|job| (Stage::Secondary, job)))?;

        self.in_flight += 1;
        Some(next)
    }

    /// Marks one dispatched stage as complete.
    pub(crate) fn complete(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn primary_len(&self) -> usize {
        self.primary.len()
    }

    pub(crate) fn secondary_len(&self) -> usize {
        self.secondary.len()
    }

    /// No queued or in-flight work.
    pub(crate) fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.primary.is_empty() && self.secondary.is_empty()
    }
}
