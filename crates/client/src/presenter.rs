//! Output and prompt seams between the controller and a user interface.

use async_trait::async_trait;
use serde::Serialize;
use shelfwatch_core::gate::{Decision, GatedAction};
use shelfwatch_core::types::Timestamp;
use shelfwatch_core::view::{DashboardSnapshot, EventDetailView};
use shelfwatch_core::wire::{DetectionResult, NewDetection, ProductCount};

/// Image shown when a detection has no stored image.
pub const PLACEHOLDER_IMAGE: &str = "/static/placeholder.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Transient message, e.g. a toast or status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// A pushed detection, as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub device_id: String,
    pub nestle_count: u64,
    pub competitor_count: u64,
    pub timestamp: Timestamp,
    /// Site-relative image URL, or the placeholder.
    pub image_url: String,
    pub has_image: bool,
}

impl From<&NewDetection> for Announcement {
    fn from(d: &NewDetection) -> Self {
        let image_url = match d.image_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => format!("/{}", path.trim_start_matches('/')),
            None => PLACEHOLDER_IMAGE.to_string(),
        };
        Self {
            device_id: d.device_id.clone(),
            nestle_count: d.nestle_count,
            competitor_count: d.competitor_count,
            timestamp: d.timestamp,
            has_image: image_url != PLACEHOLDER_IMAGE,
            image_url,
        }
    }
}

/// Receives everything the dashboard wants to show.
pub trait Presenter: Send + Sync {
    fn render(&self, snapshot: &DashboardSnapshot);

    fn announce(&self, announcement: &Announcement);

    fn notify(&self, notification: &Notification);

    /// Result panel of a completed upload.
    fn show_detection(&self, _result: &DetectionResult) {}

    fn show_event_detail(&self, _detail: &EventDetailView) {}

    fn show_products(&self, _products: &[ProductCount]) {}
}

/// Blocking confirmation shown while a review is pending.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, action: GatedAction, message: &str) -> Decision;
}

/// Prompt that declines everything, for headless use.
pub struct AlwaysCancel;

#[async_trait]
impl ConfirmPrompt for AlwaysCancel {
    async fn confirm(&self, _action: GatedAction, _message: &str) -> Decision {
        Decision::Cancel
    }
}
