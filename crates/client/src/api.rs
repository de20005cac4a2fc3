//! REST client for the detection backend.
//!
//! [`DashboardApi`] wraps the backend's HTTP endpoints using [`reqwest`].
//! The [`DashboardBackend`] trait is the seam the controller depends on,
//! so tests can substitute an in-memory backend.

use std::time::Duration;

use async_trait::async_trait;
use shelfwatch_core::event::Feedback;
use shelfwatch_core::summary::DashboardSummary;
use shelfwatch_core::types::EventId;
use shelfwatch_core::wire::{DetectionResult, EventDetail, EventsPage, FeedbackRequest, ProductCount};

/// Default HTTP timeout for backend requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Multipart field the upload endpoint reads the image from.
const UPLOAD_FIELD: &str = "image";

/// Broad failure classes callers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never completed or came back non-2xx.
    NetworkFailure,
    /// A 2xx body that did not have the expected shape.
    MalformedResponse,
}

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Status {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body could not be decoded into the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Request(_) | ApiError::Status { .. } => FailureKind::NetworkFailure,
            ApiError::Malformed(_) => FailureKind::MalformedResponse,
        }
    }
}

/// An image chosen for upload. Held in an `Option` by the caller so a
/// declined upload can clear it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// MIME type, when known.
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            content_type: None,
        }
    }

    /// Guess an image MIME type from the file extension.
    pub fn guess_content_type(file_name: &str) -> Option<&'static str> {
        let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "webp" => Some("image/webp"),
            "bmp" => Some("image/bmp"),
            _ => None,
        }
    }
}

/// Operations the dashboard needs from the backend.
#[async_trait]
pub trait DashboardBackend: Send + Sync {
    /// `GET /api/dashboard_data`
    async fn dashboard_data(&self) -> Result<DashboardSummary, ApiError>;

    /// `GET /api/events?page&limit`
    async fn events_page(&self, page: u32, limit: u32) -> Result<EventsPage, ApiError>;

    /// `GET /api/events/:id`
    async fn event_detail(&self, id: EventId) -> Result<EventDetail, ApiError>;

    /// `POST /api/events/:id/feedback`
    async fn submit_feedback(&self, id: EventId, feedback: Feedback) -> Result<(), ApiError>;

    /// `POST /check_image`
    async fn check_image(&self, upload: &UploadFile) -> Result<DetectionResult, ApiError>;

    /// `GET /api/all_products`
    async fn all_products(&self) -> Result<Vec<ProductCount>, ApiError>;
}

/// HTTP client for one detection backend.
pub struct DashboardApi {
    client: reqwest::Client,
    api_url: String,
}

impl DashboardApi {
    /// Create a client for `api_url` (e.g. `http://host:5000`) with the
    /// given request timeout.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    // ---- private helpers ----

    /// Return the response unchanged on 2xx, otherwise an
    /// [`ApiError::Status`] carrying the body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Decode a successful JSON body. Decoding failures are reported as
    /// [`ApiError::Malformed`], not as transport errors.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        decode_body(&text)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Decode a JSON body into `T`.
pub fn decode_body<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Malformed(e.to_string()))
}

#[async_trait]
impl DashboardBackend for DashboardApi {
    async fn dashboard_data(&self) -> Result<DashboardSummary, ApiError> {
        let response = self.client.get(self.url("/api/dashboard_data")).send().await?;
        Self::parse_response(response).await
    }

    async fn events_page(&self, page: u32, limit: u32) -> Result<EventsPage, ApiError> {
        let response = self
            .client
            .get(self.url("/api/events"))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn event_detail(&self, id: EventId) -> Result<EventDetail, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/events/{id}")))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn submit_feedback(&self, id: EventId, feedback: Feedback) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/api/events/{id}/feedback")))
            .json(&FeedbackRequest { feedback })
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn check_image(&self, upload: &UploadFile) -> Result<DetectionResult, ApiError> {
        let mut part = reqwest::multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone());
        let content_type = upload
            .content_type
            .as_deref()
            .or_else(|| UploadFile::guess_content_type(&upload.file_name));
        if let Some(mime) = content_type {
            part = part.mime_str(mime)?;
        }
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.url("/check_image"))
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn all_products(&self) -> Result<Vec<ProductCount>, ApiError> {
        let response = self.client.get(self.url("/api/all_products")).send().await?;
        Self::parse_response(response).await
    }
}
