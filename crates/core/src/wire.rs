//! JSON shapes exchanged with the detection backend.
//!
//! Every field the backend may omit is optional here; derivation rules in
//! [`crate::merge`] decide how absent values fall back.

use serde::{Deserialize, Serialize};

use crate::event::{CompetitorProducts, Feedback, Products};
use crate::time::{deserialize_opt_timestamp, deserialize_timestamp};
use crate::types::{EventId, ProductCounts, Timestamp};

/// One row of `GET /api/events`.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRow {
    pub id: EventId,
    #[serde(default)]
    pub device_id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub nestle_count: Option<u64>,
    #[serde(default)]
    pub competitor_count: Option<u64>,
    #[serde(default)]
    pub iqi_score: Option<f64>,
    #[serde(default)]
    pub nestle_feedback: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// `pagination` block of the events list.
#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    pub total: u64,
}

/// Body of `GET /api/events?page&limit`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsPage {
    pub data: Vec<SummaryRow>,
    #[serde(default)]
    pub pagination: Option<PageInfo>,
}

impl EventsPage {
    /// Backend total, or the row count when the backend omits pagination.
    pub fn raw_total(&self) -> u64 {
        self.pagination
            .as_ref()
            .map_or(self.data.len() as u64, |p| p.total)
    }
}

/// Body of `GET /api/events/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventDetail {
    #[serde(default)]
    pub id: Option<EventId>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub products: Option<Products>,
    #[serde(default)]
    pub nestle_count: Option<u64>,
    #[serde(default)]
    pub competitor_count: Option<u64>,
    #[serde(default)]
    pub iqi_score: Option<f64>,
    #[serde(default)]
    pub nestle_feedback: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// Body of `POST /api/events/:id/feedback`.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRequest {
    pub feedback: Feedback,
}

/// Body returned by `POST /check_image`.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionResult {
    pub id: EventId,
    #[serde(default)]
    pub total_nestle: Option<u64>,
    #[serde(default)]
    pub total_competitor: Option<u64>,
    #[serde(default)]
    pub nestle_products: ProductCounts,
    #[serde(default)]
    pub competitor_products: Option<CompetitorProducts>,
    #[serde(default)]
    pub iqi_score: Option<f64>,
    #[serde(default)]
    pub labeled_image: Option<String>,
    /// Calendar day (`YYYY-MM-DD`) the backend filed the detection under.
    #[serde(default)]
    pub date: Option<String>,
}

impl DetectionResult {
    pub fn nestle_sum(&self) -> u64 {
        self.nestle_products.values().sum()
    }

    pub fn competitor_sum(&self) -> u64 {
        self.competitor_products
            .as_ref()
            .map_or(0, CompetitorProducts::total)
    }
}

/// One entry of `GET /api/all_products` and of `top_products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCount {
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

/// Payload of the `new_detection` push event.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDetection {
    pub device_id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub nestle_count: u64,
    #[serde(default)]
    pub competitor_count: u64,
    #[serde(default)]
    pub image_path: Option<String>,
}
