//! Bounded activity buffer
//!
//! Holds at most `capacity` records, newest first. Appending past capacity
//! evicts the oldest record. The buffer also owns the progress gauge (the
//! most recent non-negative progress seen) and the pause gate: while paused,
//! appends are dropped for good, not queued.

use std::collections::vec_deque::{self, VecDeque};
use std::sync::Arc;

use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use crate::types::{ActivityDraft, ActivityRecord};

/// Newest-first store of classified activity records.
pub struct ActivityBuffer {
    records: VecDeque<ActivityRecord>,
    capacity: usize,
    progress: u8,
    paused: bool,
    clock: Arc<dyn Clock>,
}

impl ActivityBuffer {
    /// Create a buffer using wall-clock timestamps.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            progress: 0,
            paused: false,
            clock,
        }
    }

    /// Insert a classified draft.
    ///
    /// Returns the stored record, or `None` when the buffer is paused.
    pub fn append(&mut self, draft: ActivityDraft) -> Option<&ActivityRecord> {
        if self.paused {
            tracing::trace!("Buffer paused, dropping activity");
            return None;
        }

        if let Some(p) = draft.progress.and_then(|p| p.percent()) {
            self.progress = p;
        }

        let timestamp = self.clock.now();
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!("{}-{}", timestamp.timestamp_millis(), &suffix[..8]);
        let record = ActivityRecord::from_draft(draft, id, timestamp);

        tracing::debug!(
            id = %record.id,
            activity_type = %record.activity_type,
            level = %record.level,
            agent = %record.agent,
            "Activity recorded"
        );

        self.records.push_front(record);
        while self.records.len() > self.capacity {
            self.records.pop_back();
        }

        self.records.front()
    }

    /// Drop every record and reset the gauge to 0.
    pub fn clear(&mut self) {
        self.records.clear();
        self.progress = 0;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Records, newest first.
    pub fn records(&self) -> vec_deque::Iter<'_, ActivityRecord> {
        self.records.iter()
    }

    /// Current progress gauge (0..=100).
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::fmt::Debug for ActivityBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityBuffer")
            .field("len", &self.records.len())
            .field("capacity", &self.capacity)
            .field("progress", &self.progress)
            .field("paused", &self.paused)
            .finish()
    }
}
