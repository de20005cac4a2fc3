//! The single mutable dashboard state and its refresh bookkeeping.
//!
//! Refreshes are issued tickets from a monotonically increasing counter.
//! A completion is applied only when its ticket is still the newest one
//! issued and the page it was fetched for is still the current page.
//! Anything else is stale and dropped without touching state.

use crate::aggregate::EventAggregator;
use crate::error::CoreError;
use crate::event::{EventRecord, Feedback};
use crate::gate::FeedbackGate;
use crate::optimistic::{apply_daily_delta, synthesize_record, upload_day};
use crate::pagination::{PageCorrection, PaginationController};
use crate::summary::DashboardSummary;
use crate::types::{EventId, Timestamp};
use crate::view::{DashboardSnapshot, EventRow, TableView, NO_DETECTION_EVENTS, NO_VISIBLE_EVENTS};
use crate::wire::DetectionResult;

/// Handle for one in-flight events refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub token: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Handle for one in-flight summary refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryTicket {
    pub token: u64,
}

/// What happened to a completed events refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied(PageCorrection),
    /// A newer refresh was started or the page changed meanwhile.
    Stale,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub pagination: PaginationController,
    pub events: EventAggregator,
    pub gate: FeedbackGate,
    pub summary: Option<DashboardSummary>,
    pub list_error: Option<String>,
    latest_refresh: u64,
    latest_summary: u64,
}

impl DashboardState {
    pub fn new(page_size: u32) -> Result<Self, CoreError> {
        Ok(Self {
            pagination: PaginationController::new(page_size)?,
            events: EventAggregator::new(),
            gate: FeedbackGate::new(),
            summary: None,
            list_error: None,
            latest_refresh: 0,
            latest_summary: 0,
        })
    }

    /* --- Events refresh --- */

    /// Start an events refresh for the current page. Every earlier ticket
    /// becomes stale.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.latest_refresh += 1;
        RefreshTicket {
            token: self.latest_refresh,
            page: self.pagination.current_page(),
            page_size: self.pagination.page_size(),
        }
    }

    pub fn is_current(&self, ticket: &RefreshTicket) -> bool {
        ticket.token == self.latest_refresh && ticket.page == self.pagination.current_page()
    }

    /// Replace the page with a completed refresh, then re-derive the
    /// effective total and self-correct the page cursor.
    pub fn apply_refresh(
        &mut self,
        ticket: &RefreshTicket,
        records: Vec<EventRecord>,
        raw_total: u64,
    ) -> RefreshOutcome {
        if !self.is_current(ticket) {
            return RefreshOutcome::Stale;
        }
        self.events.replace_page(records, raw_total);
        self.list_error = None;
        let correction = self.pagination.set_total(self.events.effective_total());
        RefreshOutcome::Applied(correction)
    }

    /// Record a failed list fetch. Collection and pagination are left as
    /// they were. Returns whether the failure was current.
    pub fn fail_refresh(&mut self, ticket: &RefreshTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.list_error = Some(message.into());
        true
    }

    /* --- Summary refresh --- */

    pub fn begin_summary_refresh(&mut self) -> SummaryTicket {
        self.latest_summary += 1;
        SummaryTicket {
            token: self.latest_summary,
        }
    }

    /// Store a fetched summary if no newer summary refresh or local
    /// mutation happened since `ticket` was issued.
    pub fn apply_summary(&mut self, ticket: &SummaryTicket, summary: DashboardSummary) -> bool {
        if ticket.token != self.latest_summary {
            return false;
        }
        self.summary = Some(summary);
        true
    }

    /* --- Local mutations --- */

    /// Reflect a completed upload: prepend the synthesized record, count it
    /// into its day, and arm the feedback gate. In-flight refreshes are
    /// superseded so they cannot erase the new record, and the view returns
    /// to page 1 where the backend lists it first.
    pub fn apply_upload(&mut self, result: &DetectionResult, now: Timestamp) -> EventRecord {
        let record = synthesize_record(result, now);
        let day = upload_day(result, now);

        self.events.prepend(record.clone());
        apply_daily_delta(
            self.summary.get_or_insert_with(DashboardSummary::default),
            &day,
            &record,
        );
        self.gate.arm(record.id);
        self.pagination.reset();
        self.pagination.set_total(self.events.effective_total());

        self.latest_refresh += 1;
        self.latest_summary += 1;
        record
    }

    /// Id of the record that feedback targets.
    pub fn feedback_target(&self) -> Result<EventId, CoreError> {
        self.events.head_id()
    }

    /// Store feedback the backend accepted and release the gate. Returns
    /// whether the record was still in the collection.
    pub fn apply_feedback(&mut self, id: EventId, feedback: Feedback) -> bool {
        let updated = self.events.set_feedback(id, feedback).is_ok();
        self.gate.resolve();
        self.pagination.set_total(self.events.effective_total());
        updated
    }

    /* --- Rendering --- */

    pub fn table(&self) -> TableView {
        if let Some(message) = &self.list_error {
            return TableView::Error(message.clone());
        }
        if self.events.is_empty() {
            return TableView::Empty(NO_DETECTION_EVENTS);
        }
        let rows: Vec<EventRow> = self.events.visible().map(EventRow::from).collect();
        if rows.is_empty() {
            TableView::Empty(NO_VISIBLE_EVENTS)
        } else {
            TableView::Rows(rows)
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            table: self.table(),
            current_page: self.pagination.current_page(),
            page_size: self.pagination.page_size(),
            total_events: self.pagination.total_events(),
            bounds: self.pagination.bounds(),
            caption: self.pagination.caption(),
            can_prev: self.pagination.can_prev(),
            can_next: self.pagination.can_next(),
            gate: self.gate.state(),
            summary: self.summary.clone(),
        }
    }
}
