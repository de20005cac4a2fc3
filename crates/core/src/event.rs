//! The canonical detection event and its derived display fields.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::time::is_new_at;
use crate::types::{EventId, ProductCounts, Timestamp};

/* --------------------------------------------------------------------------
Feedback
-------------------------------------------------------------------------- */

/// Wire value for an approved detection.
pub const FEEDBACK_APPROVED: &str = "Approved";

/// Wire value for a detection that needs improvement.
pub const FEEDBACK_NEEDS_IMPROVEMENT: &str = "Needs Improvement";

/// Human review outcome for a detection. Absence of feedback is modelled
/// as `Option::<Feedback>::None` on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Feedback {
    /// The string the backend stores and expects.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Feedback::Approved => FEEDBACK_APPROVED,
            Feedback::NeedsImprovement => FEEDBACK_NEEDS_IMPROVEMENT,
        }
    }

    /// Lenient conversion of a stored feedback column. Empty or unknown
    /// values mean the event has not been reviewed.
    pub fn from_stored(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|s| s.parse().ok())
    }
}

impl FromStr for Feedback {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            FEEDBACK_APPROVED => Ok(Feedback::Approved),
            FEEDBACK_NEEDS_IMPROVEMENT => Ok(Feedback::NeedsImprovement),
            other => Err(CoreError::Validation(format!(
                "Invalid feedback '{other}'. Must be one of: {FEEDBACK_APPROVED}, {FEEDBACK_NEEDS_IMPROVEMENT}"
            ))),
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/* --------------------------------------------------------------------------
Product breakdown
-------------------------------------------------------------------------- */

/// Competitor detections arrive either as a name->count map or as a flat
/// list of unclassified detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompetitorProducts {
    List(Vec<serde_json::Value>),
    Map(ProductCounts),
}

/// Label used when competitor detections carry no product names.
pub const UNCLASSIFIED_LABEL: &str = "unclassified";

impl CompetitorProducts {
    /// List length, or the sum of map values.
    pub fn total(&self) -> u64 {
        match self {
            CompetitorProducts::List(items) => items.len() as u64,
            CompetitorProducts::Map(map) => map.values().sum(),
        }
    }

    /// Rows for a product breakdown. Lists and maps keyed only by indices
    /// collapse into a single unclassified row.
    pub fn breakdown(&self) -> Vec<(String, u64)> {
        match self {
            CompetitorProducts::List(items) => {
                vec![(UNCLASSIFIED_LABEL.to_string(), items.len() as u64)]
            }
            CompetitorProducts::Map(map) if map.keys().all(|k| k.parse::<i64>().is_ok()) => {
                vec![(UNCLASSIFIED_LABEL.to_string(), map.len() as u64)]
            }
            CompetitorProducts::Map(map) => map.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }
}

/// Structured per-product breakdown of one detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Products {
    #[serde(default)]
    pub nestle_products: Option<ProductCounts>,
    #[serde(default)]
    pub competitor_products: Option<CompetitorProducts>,
}

impl Products {
    pub fn nestle_total(&self) -> Option<u64> {
        self.nestle_products.as_ref().map(|m| m.values().sum())
    }

    pub fn competitor_total(&self) -> Option<u64> {
        self.competitor_products.as_ref().map(CompetitorProducts::total)
    }

    /// True when neither side carries any entries.
    pub fn is_empty(&self) -> bool {
        let nestle_empty = self.nestle_products.as_ref().map_or(true, |m| m.is_empty());
        let competitor_empty = match &self.competitor_products {
            None => true,
            Some(CompetitorProducts::List(items)) => items.is_empty(),
            Some(CompetitorProducts::Map(map)) => map.is_empty(),
        };
        nestle_empty && competitor_empty
    }
}

/* --------------------------------------------------------------------------
Image quality
-------------------------------------------------------------------------- */

/// Quality band of an Image Quality Index score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IqiBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl IqiBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            IqiBand::Excellent
        } else if score >= 60.0 {
            IqiBand::Good
        } else if score >= 40.0 {
            IqiBand::Fair
        } else {
            IqiBand::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IqiBand::Excellent => "Excellent quality",
            IqiBand::Good => "Good quality",
            IqiBand::Fair => "Fair quality",
            IqiBand::Poor => "Poor quality",
        }
    }
}

/// Clamp a backend IQI score into `[0, 100]`; NaN becomes 0.
pub fn clamp_iqi(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Rounded percentage of `part` in `total`, 0 when `total` is 0.
pub fn share_percent(part: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u8
}

/* --------------------------------------------------------------------------
EventRecord
-------------------------------------------------------------------------- */

/// One detection occurrence as held in the in-memory collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub id: EventId,
    pub device_id: String,
    pub timestamp: Timestamp,
    pub nestle_count: u64,
    pub competitor_count: u64,
    pub iqi_score: f64,
    pub feedback: Option<Feedback>,
    pub image_path: Option<String>,
    pub products: Option<Products>,
    /// Derived at merge time; never sent to the backend.
    pub is_new: bool,
}

impl EventRecord {
    /// The record is the kind of event that must be reviewed before the
    /// user moves on: fresh and without feedback.
    pub fn awaits_review(&self) -> bool {
        self.is_new && self.feedback.is_none()
    }

    /// Age `is_new` against a new reference instant. A record only ever
    /// stops being new here; rows merged without detail stay not new.
    pub fn refresh_is_new(&mut self, now: Timestamp, window: chrono::Duration) {
        self.is_new = self.is_new && is_new_at(self.timestamp, now, window);
    }

    pub fn total_count(&self) -> u64 {
        self.nestle_count + self.competitor_count
    }

    pub fn nestle_percent(&self) -> u8 {
        share_percent(self.nestle_count, self.total_count())
    }

    pub fn competitor_percent(&self) -> u8 {
        share_percent(self.competitor_count, self.total_count())
    }

    pub fn iqi_band(&self) -> IqiBand {
        IqiBand::from_score(self.iqi_score)
    }

    /// File name used by the image download route.
    pub fn download_name(&self) -> Option<&str> {
        self.image_path
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}
