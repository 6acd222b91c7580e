//! The per-session activity monitor
//!
//! [`ActivityMonitor`] owns one buffer and, optionally, one status poller.
//! Each inbound event is handled in a single synchronous call
//! (decode → normalize → classify → append), so arrival order is exactly
//! buffer order.

use std::sync::Arc;

use tokio::sync::watch;

use super::buffer::ActivityBuffer;
use super::classify::{classify, parse_failure};
use super::clock::{Clock, SystemClock};
use super::event::RawEvent;
use super::normalize::normalize;
use super::projection::{ActivityFilter, ActivitySummary};
use crate::config::MonitorConfig;
use crate::status::PollerHandle;
use crate::types::{ActivityRecord, SystemStatus};

/// Owned monitor state handed to whichever view displays it.
pub struct ActivityMonitor {
    buffer: ActivityBuffer,
    status: watch::Receiver<SystemStatus>,
    poller: Option<PollerHandle>,
}

impl ActivityMonitor {
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &MonitorConfig, clock: Arc<dyn Clock>) -> Self {
        // No sender: status stays at its default until a poller is attached.
        let (_, status) = watch::channel(SystemStatus::default());
        Self {
            buffer: ActivityBuffer::with_clock(config.capacity, clock),
            status,
            poller: None,
        }
    }

    /// Take ownership of a running poller; its snapshots back `current_status`.
    ///
    /// Any previously attached poller is shut down.
    pub fn attach_poller(&mut self, handle: PollerHandle) {
        self.status = handle.subscribe();
        if let Some(mut previous) = self.poller.replace(handle) {
            previous.shutdown();
        }
    }

    /// Follow an externally owned status channel instead of a poller.
    pub fn watch_status(&mut self, status: watch::Receiver<SystemStatus>) {
        self.status = status;
    }

    /// Normalize, classify and store one event.
    ///
    /// Returns the stored record, or `None` while paused.
    pub fn append(&mut self, event: &RawEvent) -> Option<&ActivityRecord> {
        if self.buffer.is_paused() {
            return None;
        }
        let draft = classify(&normalize(event));
        self.buffer.append(draft)
    }

    /// Decode one transport frame and append it.
    ///
    /// A frame that cannot be decoded becomes an error record instead of an error.
    pub fn append_frame(&mut self, frame: &str) -> Option<&ActivityRecord> {
        if self.buffer.is_paused() {
            return None;
        }
        match RawEvent::parse(frame) {
            Ok(event) => self.append(&event),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse activity event");
                self.buffer.append(parse_failure(&e.to_string(), frame))
            }
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn pause(&mut self) {
        self.buffer.pause();
    }

    pub fn resume(&mut self) {
        self.buffer.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.buffer.is_paused()
    }

    /// Every buffered record, newest first.
    pub fn records(&self) -> impl ExactSizeIterator<Item = &ActivityRecord> + '_ {
        self.buffer.records()
    }

    /// Buffered records passing `filter`, newest first.
    pub fn filter(&self, filter: &ActivityFilter) -> Vec<&ActivityRecord> {
        filter.apply(self.buffer.records())
    }

    pub fn summary(&self) -> ActivitySummary {
        ActivitySummary::from_records(self.buffer.records())
    }

    pub fn current_progress(&self) -> u8 {
        self.buffer.progress()
    }

    pub fn current_status(&self) -> SystemStatus {
        self.status.borrow().clone()
    }

    pub fn buffer(&self) -> &ActivityBuffer {
        &self.buffer
    }

    /// Stop the attached poller, if any. Also happens on drop.
    pub fn shutdown(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.shutdown();
        }
    }
}
