//! Event watermark
//!
//! Services return event pages most-recent-first and the same events show up
//! again on every poll. The cursor keeps the newest timestamp already shown so
//! each event is surfaced once, in chronological order.

use chrono::{DateTime, Utc};

use super::types::EventRecord;

/// Tracks the last surfaced event timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCursor {
    watermark: DateTime<Utc>,
}

impl EventCursor {
    /// Creates a cursor that only surfaces events after `watermark`
    #[must_use]
    pub fn new(watermark: DateTime<Utc>) -> Self {
        Self { watermark }
    }

    /// Creates a cursor positioned after the events that existed before the
    /// operation started, or at the current time if there were none
    #[must_use]
    pub fn from_existing(existing: &[EventRecord]) -> Self {
        let watermark = existing
            .iter()
            .map(|e| e.timestamp)
            .max()
            .unwrap_or_else(Utc::now);
        Self { watermark }
    }

    /// Current watermark
    #[must_use]
    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// Returns events newer than the watermark, oldest first
    #[must_use]
    pub fn filter_new(&self, events: &[EventRecord]) -> Vec<EventRecord> {
        let mut fresh: Vec<EventRecord> = events
            .iter()
            .filter(|e| e.timestamp > self.watermark)
            .cloned()
            .collect();
        // Stable sort keeps service order for equal timestamps; reversing first
        // turns most-recent-first pages into oldest-first ties.
        fresh.reverse();
        fresh.sort_by_key(|e| e.timestamp);
        fresh
    }

    /// Moves the watermark to the newest timestamp in `events`
    pub fn advance(&mut self, events: &[EventRecord]) {
        if let Some(latest) = events.iter().map(|e| e.timestamp).max()
            && latest > self.watermark
        {
            self.watermark = latest;
        }
    }

    /// Filters and advances in one step
    pub fn take_new(&mut self, events: &[EventRecord]) -> Vec<EventRecord> {
        let fresh = self.filter_new(events);
        self.advance(events);
        fresh
    }
}
