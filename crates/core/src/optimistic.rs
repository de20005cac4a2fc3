//! Local reflection of a completed upload before the backend is re-read.

use crate::event::{EventRecord, Products};
use crate::summary::DashboardSummary;
use crate::types::Timestamp;
use crate::wire::DetectionResult;

/// Device id given to records synthesized from a web upload.
pub const WEB_UPLOAD_DEVICE: &str = "web_upload";

/// Build the record shown for an upload until the canonical refresh lands.
pub fn synthesize_record(result: &DetectionResult, now: Timestamp) -> EventRecord {
    let products = Products {
        nestle_products: Some(result.nestle_products.clone()),
        competitor_products: result.competitor_products.clone(),
    };
    EventRecord {
        id: result.id,
        device_id: WEB_UPLOAD_DEVICE.to_string(),
        timestamp: now,
        nestle_count: result.nestle_sum(),
        competitor_count: result.competitor_sum(),
        iqi_score: crate::event::clamp_iqi(result.iqi_score.unwrap_or(0.0)),
        feedback: None,
        image_path: result.labeled_image.clone(),
        products: Some(products),
        is_new: true,
    }
}

/// Daily bucket the upload is counted under: the backend's `date`, or the
/// current UTC day.
pub fn upload_day(result: &DetectionResult, now: Timestamp) -> String {
    result
        .date
        .clone()
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| now.format("%Y-%m-%d").to_string())
}

/// Add the record's counts to the upload day in `summary`.
pub fn apply_daily_delta(summary: &mut DashboardSummary, day: &str, record: &EventRecord) {
    summary.add_to_day(day, record.nestle_count, record.competitor_count);
}
