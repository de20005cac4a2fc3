//! Dashboard controller.
//!
//! [`Dashboard`] owns the single [`DashboardState`] behind an async
//! `RwLock` and drives every workflow: page refreshes, the periodic poll,
//! push-triggered refreshes, uploads, feedback and gated navigation.
//! Locks are only taken for short synchronous sections and are always
//! released before a network call or a presenter/prompt callback.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shelfwatch_core::error::CoreError;
use shelfwatch_core::event::{EventRecord, Feedback};
use shelfwatch_core::gate::{Decision, GateState, GatedAction, Interception, FEEDBACK_REQUIRED_MESSAGE};
use shelfwatch_core::pagination::{PageCorrection, DEFAULT_PAGE_SIZE};
use shelfwatch_core::state::{DashboardState, RefreshOutcome};
use shelfwatch_core::time::default_new_event_window;
use shelfwatch_core::types::EventId;
use shelfwatch_core::view::{DashboardSnapshot, EventDetailView};
use shelfwatch_core::wire::{DetectionResult, NewDetection, ProductCount};
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, DashboardBackend, UploadFile};
use crate::events::DashboardEvent;
use crate::merger::DetailMerger;
use crate::presenter::{Announcement, ConfirmPrompt, Notification, Presenter};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Broadcast channel capacity for controller events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default period of the background poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Prefix of the inline error that replaces the table.
pub const LIST_ERROR_PREFIX: &str = "Error loading detection events";

pub const FEEDBACK_SUCCESS_MESSAGE: &str = "Feedback updated successfully";
pub const FEEDBACK_ERROR_MESSAGE: &str = "Error updating feedback";
pub const NO_EVENTS_MESSAGE: &str = "Error: No events available";
pub const UPLOAD_PROCESSING_MESSAGE: &str = "Processing image...";
pub const UPLOAD_COMPLETE_MESSAGE: &str = "Processing complete!";
pub const UPLOAD_ERROR_PREFIX: &str = "Error processing image";
pub const DETAIL_ERROR_MESSAGE: &str = "Error loading event details";
pub const PRODUCTS_ERROR_MESSAGE: &str = "Error loading product data";

/* --------------------------------------------------------------------------
Types
-------------------------------------------------------------------------- */

/// Runtime knobs for the controller.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub page_size: u32,
    pub poll_interval: Duration,
    pub new_event_window: chrono::Duration,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            new_event_window: default_new_event_window(),
        }
    }
}

/// A completed upload: the locally shown record and the backend's result.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub record: EventRecord,
    pub result: DetectionResult,
}

/// Errors from dashboard workflows.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The user declined to abandon a pending review.
    #[error("Action cancelled: feedback for the latest detection is pending")]
    Cancelled,
}

pub struct Dashboard {
    backend: Arc<dyn DashboardBackend>,
    merger: DetailMerger,
    state: RwLock<DashboardState>,
    presenter: Arc<dyn Presenter>,
    prompt: Arc<dyn ConfirmPrompt>,
    event_tx: broadcast::Sender<DashboardEvent>,
    options: DashboardOptions,
}

impl Dashboard {
    pub fn new(
        backend: Arc<dyn DashboardBackend>,
        presenter: Arc<dyn Presenter>,
        prompt: Arc<dyn ConfirmPrompt>,
        options: DashboardOptions,
    ) -> Result<Arc<Self>, DashboardError> {
        let state = DashboardState::new(options.page_size)?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Arc::new(Self {
            merger: DetailMerger::new(Arc::clone(&backend), options.new_event_window),
            backend,
            state: RwLock::new(state),
            presenter,
            prompt,
            event_tx,
            options,
        }))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.event_tx.subscribe()
    }

    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn review_required(&self) -> bool {
        self.state.read().await.gate.review_required()
    }

    pub async fn gate_state(&self) -> GateState {
        self.state.read().await.gate.state()
    }

    /// Load the summary and the first page.
    pub async fn initialize(&self) -> Result<(), DashboardError> {
        tracing::info!(page_size = self.options.page_size, "Initializing dashboard");
        // A missing summary does not block the events table.
        if let Err(e) = self.refresh_summary().await {
            tracing::debug!(error = %e, "Initial summary unavailable");
        }
        self.refresh_events().await.map(|_| ())
    }

    /* --- Refresh --- */

    /// Fetch the summary statistics. On failure the previous summary is
    /// kept.
    pub async fn refresh_summary(&self) -> Result<(), DashboardError> {
        let ticket = self.state.write().await.begin_summary_refresh();

        match self.backend.dashboard_data().await {
            Ok(summary) => {
                let applied = self.state.write().await.apply_summary(&ticket, summary);
                if applied {
                    self.emit(DashboardEvent::SummaryRefreshed);
                    self.render().await;
                } else {
                    tracing::debug!(token = ticket.token, "Discarding superseded summary");
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch dashboard data");
                self.emit(DashboardEvent::SummaryFailed {
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Re-fetch and merge the current page.
    ///
    /// If the new effective total leaves the current page past the end,
    /// the cursor resets to page 1 and page 1 is fetched once more. A
    /// completion superseded by a newer refresh or a page change is
    /// dropped and reported as [`RefreshOutcome::Stale`].
    pub async fn refresh_events(&self) -> Result<RefreshOutcome, DashboardError> {
        let mut corrected = false;

        loop {
            let ticket = self.state.write().await.begin_refresh();

            let page = match self.merger.fetch_page(ticket.page, ticket.page_size).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(page = ticket.page, error = %e, "Failed to fetch events");
                    let message = format!("{LIST_ERROR_PREFIX}: {e}");
                    let current = self.state.write().await.fail_refresh(&ticket, message);
                    if current {
                        self.render().await;
                    }
                    self.emit(DashboardEvent::RefreshFailed {
                        page: ticket.page,
                        error: e.to_string(),
                    });
                    return Err(e.into());
                }
            };

            let (outcome, total_events) = {
                let mut state = self.state.write().await;
                let outcome = state.apply_refresh(&ticket, page.records, page.raw_total);
                (outcome, state.pagination.total_events())
            };

            match outcome {
                RefreshOutcome::Stale => {
                    tracing::debug!(
                        token = ticket.token,
                        page = ticket.page,
                        "Discarding superseded events refresh",
                    );
                    self.emit(DashboardEvent::RefreshDiscarded {
                        token: ticket.token,
                        page: ticket.page,
                    });
                    return Ok(outcome);
                }
                RefreshOutcome::Applied(PageCorrection::ResetToFirst) if !corrected => {
                    tracing::info!(
                        from_page = ticket.page,
                        total_events,
                        "Page out of range, returning to page 1",
                    );
                    corrected = true;
                }
                RefreshOutcome::Applied(_) => {
                    tracing::info!(page = ticket.page, total_events, "Events refreshed");
                    self.emit(DashboardEvent::EventsRefreshed {
                        page: ticket.page,
                        total_events,
                    });
                    self.render().await;
                    return Ok(outcome);
                }
            }
        }
    }

    /// Advance one page. Returns whether the page changed.
    pub async fn next_page(&self) -> Result<bool, DashboardError> {
        let moved = self.state.write().await.pagination.next_page();
        if moved {
            self.refresh_events().await?;
        }
        Ok(moved)
    }

    /// Go back one page. Returns whether the page changed.
    pub async fn prev_page(&self) -> Result<bool, DashboardError> {
        let moved = self.state.write().await.pagination.prev_page();
        if moved {
            self.refresh_events().await?;
        }
        Ok(moved)
    }

    /* --- Live updates --- */

    /// React to a pushed detection: announce it, refresh the summary, and
    /// show page 1.
    pub async fn handle_new_detection(&self, detection: NewDetection) -> Result<(), DashboardError> {
        tracing::info!(
            device_id = %detection.device_id,
            nestle_count = detection.nestle_count,
            competitor_count = detection.competitor_count,
            "New detection pushed",
        );
        self.emit(DashboardEvent::DetectionPushed {
            device_id: detection.device_id.clone(),
        });
        self.presenter.announce(&Announcement::from(&detection));

        if let Err(e) = self.refresh_summary().await {
            tracing::debug!(error = %e, "Summary refresh after pushed detection failed");
        }
        self.state.write().await.pagination.reset();
        self.refresh_events().await.map(|_| ())
    }

    /// One poll cycle: always refresh the summary; refresh events only on
    /// page 1. Elsewhere the loaded records are re-aged so an expired head
    /// stops being hidden.
    pub async fn poll_tick(&self) -> Result<(), DashboardError> {
        let summary = self.refresh_summary().await;

        let needs_fetch = {
            let mut state = self.state.write().await;
            if state.pagination.current_page() == 1 {
                true
            } else {
                state
                    .events
                    .refresh_is_new(Utc::now(), self.options.new_event_window);
                let total = state.events.effective_total();
                state.pagination.set_total(total) == PageCorrection::ResetToFirst
            }
        };

        if needs_fetch {
            self.refresh_events().await?;
        } else {
            self.render().await;
        }
        summary
    }

    /// Run [`Self::poll_tick`] every poll interval until `cancel` fires.
    pub async fn run_poller(&self, cancel: CancellationToken) {
        let period = self.options.poll_interval;
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(interval_secs = period.as_secs(), "Poller started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Poller cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.poll_tick().await {
                        tracing::error!(error = %e, "Poll cycle failed");
                    }
                }
            }
        }
    }

    /* --- Gated actions --- */

    /// Ask the gate whether `action` may run, prompting the user when a
    /// review is pending.
    async fn pass_gate(&self, action: GatedAction) -> bool {
        let interception = self.state.read().await.gate.intercept(action);
        if interception == Interception::Allowed {
            return true;
        }

        let decision = self.prompt.confirm(action, FEEDBACK_REQUIRED_MESSAGE).await;
        let proceed = self.state.write().await.gate.apply_decision(decision);
        if proceed {
            tracing::info!(action = action.describe(), "Pending review abandoned");
            self.emit(DashboardEvent::GateChanged {
                state: GateState::Idle,
            });
            self.render().await;
        } else {
            tracing::info!(action = action.describe(), "Action cancelled, review still pending");
        }
        proceed
    }

    /// Leave the dashboard (logout, close). Returns the user's decision
    /// when a review is pending, `Proceed` otherwise.
    pub async fn navigate_away(&self) -> Decision {
        if self.pass_gate(GatedAction::NavigateAway).await {
            Decision::Proceed
        } else {
            Decision::Cancel
        }
    }

    /// Upload the image held in `input`.
    ///
    /// The input is consumed. It is also cleared when the user declines to
    /// abandon a pending review, in which case nothing else changes.
    pub async fn upload(&self, input: &mut Option<UploadFile>) -> Result<UploadReport, DashboardError> {
        if !self.pass_gate(GatedAction::Upload).await {
            *input = None;
            return Err(DashboardError::Cancelled);
        }
        let Some(file) = input.take() else {
            return Err(CoreError::Validation("No image selected".to_string()).into());
        };

        self.presenter.notify(&Notification::info(UPLOAD_PROCESSING_MESSAGE));
        let result = match self.backend.check_image(&file).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(file_name = %file.file_name, error = %e, "Image upload failed");
                self.presenter
                    .notify(&Notification::error(format!("{UPLOAD_ERROR_PREFIX}: {e}")));
                return Err(e.into());
            }
        };

        let record = self.state.write().await.apply_upload(&result, Utc::now());
        tracing::info!(
            event_id = record.id,
            nestle_count = record.nestle_count,
            competitor_count = record.competitor_count,
            "Upload processed",
        );
        self.emit(DashboardEvent::UploadCompleted { event_id: record.id });
        self.emit(DashboardEvent::GateChanged {
            state: GateState::PendingReview,
        });
        self.presenter.show_detection(&result);
        self.presenter.notify(&Notification::success(UPLOAD_COMPLETE_MESSAGE));
        self.render().await;

        // Canonical data supersedes the optimistic record and bucket.
        if let Err(e) = self.refresh_summary().await {
            tracing::warn!(error = %e, "Summary refresh after upload failed");
        }
        if let Err(e) = self.refresh_events().await {
            tracing::warn!(error = %e, "Events refresh after upload failed");
        }

        Ok(UploadReport { record, result })
    }

    /// Submit feedback for the newest event.
    pub async fn submit_feedback(&self, feedback: Feedback) -> Result<EventId, DashboardError> {
        let target = self.state.read().await.feedback_target();
        let id = match target {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("No events available for feedback");
                self.presenter.notify(&Notification::error(NO_EVENTS_MESSAGE));
                return Err(e.into());
            }
        };

        if let Err(e) = self.backend.submit_feedback(id, feedback).await {
            tracing::error!(event_id = id, error = %e, "Failed to update feedback");
            self.presenter.notify(&Notification::error(FEEDBACK_ERROR_MESSAGE));
            return Err(e.into());
        }

        let updated = self.state.write().await.apply_feedback(id, feedback);
        if !updated {
            tracing::debug!(event_id = id, "Feedback target left the collection");
        }
        tracing::info!(event_id = id, feedback = %feedback, "Feedback submitted");
        self.emit(DashboardEvent::FeedbackSubmitted { event_id: id, feedback });
        self.emit(DashboardEvent::GateChanged {
            state: GateState::Idle,
        });
        self.presenter.notify(&Notification::success(FEEDBACK_SUCCESS_MESSAGE));
        self.render().await;
        Ok(id)
    }

    /* --- Lookups --- */

    /// Load one event's detail and write its recomputed counts back into
    /// the collection.
    pub async fn view_event_details(&self, id: EventId) -> Result<EventDetailView, DashboardError> {
        let detail = match self.backend.event_detail(id).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::error!(event_id = id, error = %e, "Failed to load event details");
                self.presenter.notify(&Notification::error(DETAIL_ERROR_MESSAGE));
                return Err(e.into());
            }
        };

        let view = EventDetailView::from_detail(id, &detail);
        let updated = self
            .state
            .write()
            .await
            .events
            .update_counts(id, view.nestle_count, view.competitor_count);
        if updated {
            self.render().await;
        }
        self.presenter.show_event_detail(&view);
        Ok(view)
    }

    /// Every product the backend has counted.
    pub async fn all_products(&self) -> Result<Vec<ProductCount>, DashboardError> {
        match self.backend.all_products().await {
            Ok(products) => {
                self.presenter.show_products(&products);
                Ok(products)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch products");
                self.presenter.notify(&Notification::error(PRODUCTS_ERROR_MESSAGE));
                Err(e.into())
            }
        }
    }

    // ---- private helpers ----

    async fn render(&self) {
        let snapshot = self.snapshot().await;
        self.presenter.render(&snapshot);
    }

    pub(crate) fn emit(&self, event: DashboardEvent) {
        let _ = self.event_tx.send(event);
    }
}
