//! Controller-level events broadcast by [`crate::dashboard::Dashboard`].
//!
//! Subscribers use these for logging and for waiting on background work
//! in tests; rendering goes through the presenter instead.

use serde::Serialize;
use shelfwatch_core::event::Feedback;
use shelfwatch_core::gate::GateState;
use shelfwatch_core::types::EventId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DashboardEvent {
    /// The push channel joined its namespace.
    PushConnected,

    /// The push channel dropped.
    PushDisconnected,

    /// A `new_detection` push was received.
    DetectionPushed { device_id: String },

    /// The summary statistics were replaced.
    SummaryRefreshed,

    /// A summary refresh failed; previous data is kept.
    SummaryFailed { error: String },

    /// A page of events replaced the collection.
    EventsRefreshed { page: u32, total_events: u64 },

    /// A completed refresh was superseded and dropped.
    RefreshDiscarded { token: u64, page: u32 },

    /// A list fetch failed; collection and pagination are unchanged.
    RefreshFailed { page: u32, error: String },

    /// An upload was reflected locally.
    UploadCompleted { event_id: EventId },

    /// Feedback reached the backend.
    FeedbackSubmitted { event_id: EventId, feedback: Feedback },

    /// The feedback gate changed state.
    GateChanged { state: GateState },
}
