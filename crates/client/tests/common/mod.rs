#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shelfwatch_client::api::{decode_body, ApiError, DashboardBackend, UploadFile};
use shelfwatch_client::dashboard::{Dashboard, DashboardOptions};
use shelfwatch_client::presenter::{Announcement, ConfirmPrompt, Notification, Presenter};
use shelfwatch_core::event::Feedback;
use shelfwatch_core::gate::{Decision, GatedAction};
use shelfwatch_core::summary::DashboardSummary;
use shelfwatch_core::types::EventId;
use shelfwatch_core::view::{DashboardSnapshot, EventDetailView};
use shelfwatch_core::wire::{DetectionResult, EventDetail, EventsPage, ProductCount};

/// Timestamp `secs_ago` seconds before now, in the backend's naive format.
pub fn ts_ago(secs_ago: i64) -> String {
    (chrono::Utc::now() - chrono::Duration::seconds(secs_ago))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        body: "Internal Server Error".to_string(),
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        body: "Event not found".to_string(),
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Backend serving canned JSON bodies. Bodies go through the same decoder
/// as the HTTP client, so shape errors surface as `Malformed`.
#[derive(Default)]
pub struct FakeBackend {
    /// Page number -> list body.
    pages: Mutex<HashMap<u32, String>>,
    /// One-shot list responses served before `pages`, with a delay.
    list_queue: Mutex<VecDeque<(Duration, String)>>,
    list_fails: AtomicBool,
    details: Mutex<HashMap<EventId, String>>,
    detail_delays: Mutex<HashMap<EventId, Duration>>,
    summary: Mutex<Option<String>>,
    upload: Mutex<Option<String>>,
    products: Mutex<Option<String>>,
    feedback_fails: AtomicBool,

    pub list_calls: Mutex<Vec<(u32, u32)>>,
    pub detail_calls: Mutex<Vec<EventId>>,
    pub feedback_calls: Mutex<Vec<(EventId, Feedback)>>,
    pub upload_calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_page(&self, page: u32, body: &str) {
        self.pages.lock().unwrap().insert(page, body.to_string());
    }

    pub fn queue_page(&self, delay: Duration, body: &str) {
        self.list_queue
            .lock()
            .unwrap()
            .push_back((delay, body.to_string()));
    }

    pub fn fail_list(&self, fail: bool) {
        self.list_fails.store(fail, Ordering::SeqCst);
    }

    pub fn set_detail(&self, id: EventId, body: &str) {
        self.details.lock().unwrap().insert(id, body.to_string());
    }

    pub fn delay_detail(&self, id: EventId, delay: Duration) {
        self.detail_delays.lock().unwrap().insert(id, delay);
    }

    pub fn set_summary(&self, body: Option<&str>) {
        *self.summary.lock().unwrap() = body.map(str::to_string);
    }

    pub fn set_upload(&self, body: Option<&str>) {
        *self.upload.lock().unwrap() = body.map(str::to_string);
    }

    pub fn set_products(&self, body: Option<&str>) {
        *self.products.lock().unwrap() = body.map(str::to_string);
    }

    pub fn fail_feedback(&self, fail: bool) {
        self.feedback_fails.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DashboardBackend for FakeBackend {
    async fn dashboard_data(&self) -> Result<DashboardSummary, ApiError> {
        let body = self.summary.lock().unwrap().clone();
        match body {
            Some(body) => decode_body(&body),
            None => Err(server_error()),
        }
    }

    async fn events_page(&self, page: u32, limit: u32) -> Result<EventsPage, ApiError> {
        self.list_calls.lock().unwrap().push((page, limit));
        let queued = self.list_queue.lock().unwrap().pop_front();
        if let Some((delay, body)) = queued {
            tokio::time::sleep(delay).await;
            return decode_body(&body);
        }
        if self.list_fails.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        let body = self
            .pages
            .lock()
            .unwrap()
            .get(&page)
            .cloned()
            .unwrap_or_else(|| r#"{"data":[],"pagination":{"total":0}}"#.to_string());
        decode_body(&body)
    }

    async fn event_detail(&self, id: EventId) -> Result<EventDetail, ApiError> {
        self.detail_calls.lock().unwrap().push(id);
        let delay = self.detail_delays.lock().unwrap().get(&id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let body = self.details.lock().unwrap().get(&id).cloned();
        match body {
            Some(body) => decode_body(&body),
            None => Err(not_found()),
        }
    }

    async fn submit_feedback(&self, id: EventId, feedback: Feedback) -> Result<(), ApiError> {
        if self.feedback_fails.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        self.feedback_calls.lock().unwrap().push((id, feedback));
        Ok(())
    }

    async fn check_image(&self, upload: &UploadFile) -> Result<DetectionResult, ApiError> {
        self.upload_calls
            .lock()
            .unwrap()
            .push(upload.file_name.clone());
        let body = self.upload.lock().unwrap().clone();
        match body {
            Some(body) => decode_body(&body),
            None => Err(server_error()),
        }
    }

    async fn all_products(&self) -> Result<Vec<ProductCount>, ApiError> {
        let body = self.products.lock().unwrap().clone();
        match body {
            Some(body) => decode_body(&body),
            None => Err(server_error()),
        }
    }
}

// ---------------------------------------------------------------------------
// Presenter and prompt doubles
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingPresenter {
    pub snapshots: Mutex<Vec<DashboardSnapshot>>,
    pub announcements: Mutex<Vec<Announcement>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub details: Mutex<Vec<EventDetailView>>,
    pub detections: Mutex<Vec<EventId>>,
}

impl RecordingPresenter {
    pub fn last_snapshot(&self) -> Option<DashboardSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&self, snapshot: &DashboardSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }

    fn announce(&self, announcement: &Announcement) {
        self.announcements.lock().unwrap().push(announcement.clone());
    }

    fn notify(&self, notification: &Notification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }

    fn show_detection(&self, result: &DetectionResult) {
        self.detections.lock().unwrap().push(result.id);
    }

    fn show_event_detail(&self, detail: &EventDetailView) {
        self.details.lock().unwrap().push(detail.clone());
    }
}

/// Prompt answering from a script; answers `Cancel` once the script runs out.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Decision>>,
    pub asked: Mutex<Vec<GatedAction>>,
}

impl ScriptedPrompt {
    pub fn answering(answers: &[Decision]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::new(Vec::new()),
        })
    }

    pub fn times_asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

#[async_trait]
impl ConfirmPrompt for ScriptedPrompt {
    async fn confirm(&self, action: GatedAction, _message: &str) -> Decision {
        self.asked.lock().unwrap().push(action);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Decision::Cancel)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub presenter: Arc<RecordingPresenter>,
    pub prompt: Arc<ScriptedPrompt>,
    pub dashboard: Arc<Dashboard>,
}

pub fn harness(answers: &[Decision]) -> Harness {
    harness_with(answers, DashboardOptions::default())
}

pub fn harness_with(answers: &[Decision], options: DashboardOptions) -> Harness {
    let backend = FakeBackend::new();
    let presenter = Arc::new(RecordingPresenter::default());
    let prompt = ScriptedPrompt::answering(answers);
    let dashboard = Dashboard::new(
        backend.clone(),
        presenter.clone(),
        prompt.clone(),
        options,
    )
    .expect("valid options");
    Harness {
        backend,
        presenter,
        prompt,
        dashboard,
    }
}
