//! Concurrent summary/detail merge for one events page.
//!
//! Every row's detail is fetched at once and joined in row order. A row
//! whose detail fails is kept with summary data only; the page as a whole
//! fails only when the list request does.

use std::sync::Arc;

use futures::future::join_all;
use shelfwatch_core::event::EventRecord;
use shelfwatch_core::merge::{merge_event, Fetched};
use shelfwatch_core::types::{EventId, Timestamp};
use shelfwatch_core::wire::SummaryRow;

use crate::api::{ApiError, DashboardBackend};

/// A fully merged page, ready to replace the collection.
#[derive(Debug)]
pub struct MergedPage {
    pub records: Vec<EventRecord>,
    pub raw_total: u64,
    /// Rows built from summary data only.
    pub degraded: Vec<EventId>,
}

pub struct DetailMerger {
    backend: Arc<dyn DashboardBackend>,
    new_window: chrono::Duration,
}

impl DetailMerger {
    pub fn new(backend: Arc<dyn DashboardBackend>, new_window: chrono::Duration) -> Self {
        Self {
            backend,
            new_window,
        }
    }

    /// Merge one summary row with its detail.
    pub async fn merge_row(
        &self,
        row: &SummaryRow,
        now: Timestamp,
    ) -> Fetched<EventRecord, ApiError> {
        match self.backend.event_detail(row.id).await {
            Ok(detail) => {
                tracing::debug!(event_id = row.id, "Merged event detail");
                Fetched::Ok(merge_event(row, Some(&detail), now, self.new_window))
            }
            Err(e) => {
                tracing::warn!(
                    event_id = row.id,
                    error = %e,
                    "Event detail unavailable, using summary row",
                );
                Fetched::Degraded(merge_event(row, None, now, self.new_window), e)
            }
        }
    }

    /// Merge every row concurrently. Output order matches `rows`.
    pub async fn merge_rows(
        &self,
        rows: &[SummaryRow],
        now: Timestamp,
    ) -> Vec<Fetched<EventRecord, ApiError>> {
        join_all(rows.iter().map(|row| self.merge_row(row, now))).await
    }

    /// Fetch and merge one page of events.
    pub async fn fetch_page(&self, page: u32, limit: u32) -> Result<MergedPage, ApiError> {
        let listing = self.backend.events_page(page, limit).await?;
        let raw_total = listing.raw_total();
        let now = chrono::Utc::now();

        let mut records = Vec::with_capacity(listing.data.len());
        let mut degraded = Vec::new();
        for fetched in self.merge_rows(&listing.data, now).await {
            if let Fetched::Degraded(record, _) = &fetched {
                degraded.push(record.id);
            }
            if let Some(record) = fetched.into_value() {
                records.push(record);
            }
        }

        tracing::debug!(
            page,
            rows = records.len(),
            raw_total,
            degraded = degraded.len(),
            "Fetched events page",
        );

        Ok(MergedPage {
            records,
            raw_total,
            degraded,
        })
    }
}
