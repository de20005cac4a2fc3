//! Feedback gate: the newest uploaded detection must be reviewed before
//! the user uploads again or leaves the dashboard.
//!
//! ```text
//!            upload completed
//!   Idle  ------------------------->  PendingReview
//!     ^                                    |
//!     |  feedback submitted for head       |
//!     +------------------------------------+
//!     |  abandonment confirmed (Proceed)   |
//!     +------------------------------------+
//! ```
//!
//! The gate does not remember which event it is waiting on; feedback is
//! always applied to the head of the event collection.

use serde::Serialize;

use crate::types::EventId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateState {
    Idle,
    PendingReview,
}

/// Actions the gate intercepts while a review is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    Upload,
    NavigateAway,
}

impl GatedAction {
    pub fn describe(&self) -> &'static str {
        match self {
            GatedAction::Upload => "upload another image",
            GatedAction::NavigateAway => "leave the dashboard",
        }
    }
}

/// Answer to the blocking confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Cancel,
}

/// Result of asking the gate whether an action may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    Allowed,
    ConfirmationRequired,
}

/// Prompt text shown while a review is pending.
pub const FEEDBACK_REQUIRED_MESSAGE: &str = "Please provide feedback (Approved or Needs Improvement) for the latest detection before proceeding.";

#[derive(Debug, Clone, Default)]
pub struct FeedbackGate {
    pending: bool,
    /// Last uploaded event, kept for logging only.
    last_uploaded: Option<EventId>,
}

impl FeedbackGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        if self.pending {
            GateState::PendingReview
        } else {
            GateState::Idle
        }
    }

    pub fn review_required(&self) -> bool {
        self.pending
    }

    pub fn last_uploaded(&self) -> Option<EventId> {
        self.last_uploaded
    }

    /// `Idle -> PendingReview` after an upload completes.
    pub fn arm(&mut self, uploaded: EventId) {
        self.pending = true;
        self.last_uploaded = Some(uploaded);
    }

    /// `PendingReview -> Idle` after feedback reached the backend.
    /// Returns whether the state changed.
    pub fn resolve(&mut self) -> bool {
        let was_pending = self.pending;
        self.pending = false;
        self.last_uploaded = None;
        was_pending
    }

    pub fn intercept(&self, _action: GatedAction) -> Interception {
        if self.pending {
            Interception::ConfirmationRequired
        } else {
            Interception::Allowed
        }
    }

    /// Apply the user's answer to the confirmation prompt. `Proceed`
    /// abandons the pending review; `Cancel` leaves the gate untouched.
    /// Returns whether the intercepted action may run.
    pub fn apply_decision(&mut self, decision: Decision) -> bool {
        match decision {
            Decision::Proceed => {
                self.resolve();
                true
            }
            Decision::Cancel => false,
        }
    }
}
