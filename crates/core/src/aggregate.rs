//! In-memory event collection and the head-gating rule.
//!
//! The collection is ordered newest-first and holds at most one record per
//! id. Only the head can be gated: while it is new and unreviewed it is
//! hidden from the table and left out of the effective total.

use crate::error::CoreError;
use crate::event::{EventRecord, Feedback};
use crate::types::{EventId, Timestamp};

#[derive(Debug, Clone, Default)]
pub struct EventAggregator {
    records: Vec<EventRecord>,
    raw_total: u64,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn head(&self) -> Option<&EventRecord> {
        self.records.first()
    }

    /// Id of the record that feedback applies to.
    pub fn head_id(&self) -> Result<EventId, CoreError> {
        self.head().map(|r| r.id).ok_or(CoreError::NoEvents)
    }

    pub fn raw_total(&self) -> u64 {
        self.raw_total
    }

    pub fn head_is_gating(&self) -> bool {
        self.head().is_some_and(EventRecord::awaits_review)
    }

    /// Backend total minus the gated head, if any.
    pub fn effective_total(&self) -> u64 {
        if self.head_is_gating() {
            self.raw_total.saturating_sub(1)
        } else {
            self.raw_total
        }
    }

    /// Records shown in the table, in collection order.
    pub fn visible(&self) -> impl Iterator<Item = &EventRecord> {
        let skip = usize::from(self.head_is_gating());
        self.records.iter().skip(skip)
    }

    /// Replace the whole page. Later duplicates of an id are dropped.
    pub fn replace_page(&mut self, records: Vec<EventRecord>, raw_total: u64) {
        let mut seen = std::collections::HashSet::with_capacity(records.len());
        self.records = records.into_iter().filter(|r| seen.insert(r.id)).collect();
        self.raw_total = raw_total;
    }

    /// Put a locally synthesized record at the head. A record already
    /// holding the same id is replaced rather than duplicated; only a
    /// genuinely new id grows the raw total.
    pub fn prepend(&mut self, record: EventRecord) {
        let before = self.records.len();
        self.records.retain(|r| r.id != record.id);
        if self.records.len() == before {
            self.raw_total += 1;
        }
        self.records.insert(0, record);
    }

    /// Set the feedback of the record with `id`.
    pub fn set_feedback(&mut self, id: EventId, feedback: Feedback) -> Result<(), CoreError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(CoreError::NotFound { entity: "event", id })?;
        record.feedback = Some(feedback);
        Ok(())
    }

    /// Overwrite the counts of the record with `id`. Returns whether a
    /// record was found.
    pub fn update_counts(&mut self, id: EventId, nestle: u64, competitor: u64) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.nestle_count = nestle;
                record.competitor_count = competitor;
                true
            }
            None => false,
        }
    }

    /// Age every record against `now`. Records only ever stop being new.
    pub fn refresh_is_new(&mut self, now: Timestamp, window: chrono::Duration) {
        for record in &mut self.records {
            record.refresh_is_new(now, window);
        }
    }
}
