//! Summary/detail merge rules.
//!
//! A page row from the events list is combined with the row's detail
//! resource. Counts follow a precedence chain: product breakdown, then
//! detail counts, then summary counts, then zero. The first source with a
//! non-zero value wins. All other fields prefer detail over summary.

use crate::event::{clamp_iqi, EventRecord, Feedback};
use crate::time::is_new_at;
use crate::types::Timestamp;
use crate::wire::{EventDetail, SummaryRow};

/// Result of a fetch that may fall back to partial data.
#[derive(Debug)]
pub enum Fetched<T, E> {
    /// Every source answered.
    Ok(T),
    /// Usable data built from a fallback source, plus the failure that
    /// forced the fallback.
    Degraded(T, E),
    /// Nothing usable.
    Failed(E),
}

impl<T, E> Fetched<T, E> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Fetched::Ok(v) | Fetched::Degraded(v, _) => Some(v),
            Fetched::Failed(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Fetched::Ok(v) | Fetched::Degraded(v, _) => Some(v),
            Fetched::Failed(_) => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded(..))
    }
}

/// First value in precedence order that is present and non-zero.
fn first_nonzero(sources: &[Option<u64>]) -> u64 {
    sources
        .iter()
        .flatten()
        .copied()
        .find(|&n| n > 0)
        .unwrap_or(0)
}

/// Nestlé count for a merged record.
pub fn merged_nestle_count(summary: &SummaryRow, detail: Option<&EventDetail>) -> u64 {
    let from_products = detail
        .and_then(|d| d.products.as_ref())
        .and_then(|p| p.nestle_total());
    first_nonzero(&[
        from_products,
        detail.and_then(|d| d.nestle_count),
        summary.nestle_count,
    ])
}

/// Competitor count for a merged record. Lists count entries, maps sum.
pub fn merged_competitor_count(summary: &SummaryRow, detail: Option<&EventDetail>) -> u64 {
    let from_products = detail
        .and_then(|d| d.products.as_ref())
        .and_then(|p| p.competitor_total());
    first_nonzero(&[
        from_products,
        detail.and_then(|d| d.competitor_count),
        summary.competitor_count,
    ])
}

/// Counts derived from a detail resource alone, for the detail view.
pub fn detail_counts(detail: &EventDetail) -> (u64, u64) {
    let products = detail.products.as_ref();
    let nestle = first_nonzero(&[
        products.and_then(|p| p.nestle_total()),
        detail.nestle_count,
    ]);
    let competitor = first_nonzero(&[
        products.and_then(|p| p.competitor_total()),
        detail.competitor_count,
    ]);
    (nestle, competitor)
}

/// Build an [`EventRecord`] from a summary row and, when available, its
/// detail. With `detail == None` only summary data is used, missing
/// counts become zero, and the record is never new, so a degraded row is
/// always shown and never gates.
pub fn merge_event(
    summary: &SummaryRow,
    detail: Option<&EventDetail>,
    now: Timestamp,
    new_window: chrono::Duration,
) -> EventRecord {
    let timestamp = detail
        .and_then(|d| d.timestamp)
        .unwrap_or(summary.timestamp);

    let device_id = detail
        .and_then(|d| d.device_id.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| summary.device_id.clone());

    let iqi_score = first_positive(&[detail.and_then(|d| d.iqi_score), summary.iqi_score]);

    let feedback = detail
        .and_then(|d| Feedback::from_stored(d.nestle_feedback.as_deref()))
        .or_else(|| Feedback::from_stored(summary.nestle_feedback.as_deref()));

    let image_path = detail
        .and_then(|d| d.image_path.clone())
        .or_else(|| summary.image_path.clone());

    EventRecord {
        id: summary.id,
        device_id,
        timestamp,
        nestle_count: merged_nestle_count(summary, detail),
        competitor_count: merged_competitor_count(summary, detail),
        iqi_score: clamp_iqi(iqi_score),
        feedback,
        image_path,
        products: detail.and_then(|d| d.products.clone()),
        is_new: detail.is_some() && is_new_at(timestamp, now, new_window),
    }
}

fn first_positive(sources: &[Option<f64>]) -> f64 {
    sources
        .iter()
        .flatten()
        .copied()
        .find(|&v| v > 0.0)
        .unwrap_or(0.0)
}
