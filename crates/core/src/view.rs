//! Immutable render data handed to presenters.

use serde::Serialize;

use crate::event::{share_percent, EventRecord, Feedback, IqiBand, UNCLASSIFIED_LABEL};
use crate::gate::GateState;
use crate::merge::detail_counts;
use crate::pagination::PageBounds;
use crate::summary::DashboardSummary;
use crate::types::{EventId, Timestamp};
use crate::wire::EventDetail;

/// Empty table with no records loaded at all.
pub const NO_DETECTION_EVENTS: &str = "No detection events found";

/// Empty table because every loaded record is hidden.
pub const NO_VISIBLE_EVENTS: &str = "No events found";

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub id: EventId,
    pub device_id: String,
    pub timestamp: Timestamp,
    pub nestle_count: u64,
    pub competitor_count: u64,
    pub nestle_percent: u8,
    pub competitor_percent: u8,
    pub iqi_score: f64,
    pub iqi_band: IqiBand,
    pub feedback: Option<Feedback>,
    pub is_new: bool,
    pub image_path: Option<String>,
    pub download_name: Option<String>,
}

impl From<&EventRecord> for EventRow {
    fn from(record: &EventRecord) -> Self {
        Self {
            id: record.id,
            device_id: record.device_id.clone(),
            timestamp: record.timestamp,
            nestle_count: record.nestle_count,
            competitor_count: record.competitor_count,
            nestle_percent: record.nestle_percent(),
            competitor_percent: record.competitor_percent(),
            iqi_score: record.iqi_score,
            iqi_band: record.iqi_band(),
            feedback: record.feedback,
            is_new: record.is_new,
            image_path: record.image_path.clone(),
            download_name: record.download_name().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TableView {
    Rows(Vec<EventRow>),
    Empty(&'static str),
    /// The last list fetch failed; the message replaces the table.
    Error(String),
}

/// Everything a presenter needs to draw the dashboard once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub table: TableView,
    pub current_page: u32,
    pub page_size: u32,
    pub total_events: u64,
    pub bounds: PageBounds,
    pub caption: String,
    pub can_prev: bool,
    pub can_next: bool,
    pub gate: GateState,
    pub summary: Option<DashboardSummary>,
}

/// Single-event detail panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDetailView {
    pub id: EventId,
    pub device_id: Option<String>,
    pub timestamp: Option<Timestamp>,
    pub nestle_count: u64,
    pub competitor_count: u64,
    pub nestle_percent: u8,
    pub competitor_percent: u8,
    pub iqi_score: f64,
    pub iqi_band: IqiBand,
    pub nestle_products: Vec<(String, u64)>,
    pub competitor_products: Vec<(String, u64)>,
    pub feedback: Option<Feedback>,
    pub image_path: Option<String>,
}

impl EventDetailView {
    pub fn from_detail(id: EventId, detail: &EventDetail) -> Self {
        let (nestle_count, competitor_count) = detail_counts(detail);
        let total = nestle_count + competitor_count;
        let iqi_score = crate::event::clamp_iqi(detail.iqi_score.unwrap_or(0.0));
        let products = detail.products.as_ref();

        let nestle_products = products
            .and_then(|p| p.nestle_products.as_ref())
            .map(|m| m.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        // Bare competitor counts still get an unclassified row.
        let competitor_products = match products.and_then(|p| p.competitor_products.as_ref()) {
            Some(c) => c.breakdown(),
            None if competitor_count > 0 => {
                vec![(UNCLASSIFIED_LABEL.to_string(), competitor_count)]
            }
            None => Vec::new(),
        };

        Self {
            id,
            device_id: detail.device_id.clone(),
            timestamp: detail.timestamp,
            nestle_count,
            competitor_count,
            nestle_percent: share_percent(nestle_count, total),
            competitor_percent: share_percent(competitor_count, total),
            iqi_score,
            iqi_band: IqiBand::from_score(iqi_score),
            nestle_products,
            competitor_products,
            feedback: Feedback::from_stored(detail.nestle_feedback.as_deref()),
            image_path: detail.image_path.clone(),
        }
    }
}
