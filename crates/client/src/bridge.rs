//! Live update bridge: push channel frames in, dashboard refreshes out.
//!
//! [`LiveUpdateBridge::run`] keeps one push connection alive (connect,
//! process, reconnect with backoff) until cancelled. Each
//! `new_detection` event is handed to
//! [`Dashboard::handle_new_detection`](crate::dashboard::Dashboard::handle_new_detection),
//! one at a time in arrival order.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::dashboard::Dashboard;
use crate::events::DashboardEvent;
use crate::messages::{parse_event_message, parse_frame, PushFrame, PushMessage, NAMESPACE_CONNECT, PONG};
use crate::push::{PushClient, PushConnection, PushError, PushStream};
use crate::reconnect::{reconnect_loop, ReconnectPolicy};

/// What the session loop should do after one text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameAction {
    Continue,
    Reply(&'static str),
    /// The server ended the session.
    Disconnect(String),
}

pub struct LiveUpdateBridge {
    client: PushClient,
    dashboard: Arc<Dashboard>,
    reconnect: ReconnectPolicy,
}

impl LiveUpdateBridge {
    pub fn new(client: PushClient, dashboard: Arc<Dashboard>) -> Self {
        Self {
            client,
            dashboard,
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Connect, process, reconnect until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut pending: Option<PushConnection> = None;

        loop {
            let conn = match pending.take() {
                Some(conn) => conn,
                None => match self.client.connect().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Push connection failed, entering reconnect loop");
                        match reconnect_loop(&self.client, &self.reconnect, &cancel).await {
                            Some(conn) => conn,
                            None => return,
                        }
                    }
                },
            };

            if let Err(e) = self.process(conn.ws_stream, &cancel).await {
                tracing::warn!(error = %e, "Push session ended with error");
            }
            self.dashboard.emit(DashboardEvent::PushDisconnected);

            if cancel.is_cancelled() {
                tracing::info!("Live update bridge stopped");
                return;
            }

            tracing::info!("Push connection lost, entering reconnect loop");
            pending = reconnect_loop(&self.client, &self.reconnect, &cancel).await;
            if pending.is_none() {
                return;
            }
        }
    }

    /// Drive one session until the socket closes or `cancel` fires.
    async fn process(&self, ws_stream: PushStream, cancel: &CancellationToken) -> Result<(), PushError> {
        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => match self.handle_text(&text).await {
                        FrameAction::Continue => {}
                        FrameAction::Reply(reply) => {
                            write
                                .send(Message::Text(reply.to_string()))
                                .await
                                .map_err(|e| PushError::Protocol(e.to_string()))?;
                        }
                        FrameAction::Disconnect(reason) => {
                            return Err(PushError::Protocol(reason));
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Push channel closed");
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // Binary attachments and transport-level pings.
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Push receive error");
                        return Err(PushError::Protocol(e.to_string()));
                    }
                    None => return Ok(()),
                }
            }
        }
    }

    /// Interpret one text frame.
    pub async fn handle_text(&self, text: &str) -> FrameAction {
        let frame = match parse_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, raw_message = %text, "Failed to parse push frame");
                return FrameAction::Continue;
            }
        };

        match frame {
            PushFrame::Open { sid, .. } => {
                tracing::debug!(?sid, "Push transport open");
                FrameAction::Reply(NAMESPACE_CONNECT)
            }
            PushFrame::Ping => FrameAction::Reply(PONG),
            PushFrame::Pong | PushFrame::Noop | PushFrame::Ignored(_) => FrameAction::Continue,
            PushFrame::Connected => {
                tracing::info!("Connected to push namespace");
                self.dashboard.emit(DashboardEvent::PushConnected);
                FrameAction::Continue
            }
            PushFrame::Disconnected => FrameAction::Disconnect("namespace disconnected".into()),
            PushFrame::Close => FrameAction::Disconnect("transport closed".into()),
            PushFrame::ConnectError(message) => {
                tracing::error!(%message, "Push namespace refused connection");
                FrameAction::Disconnect(message)
            }
            PushFrame::Event { name, payload } => {
                match parse_event_message(&name, payload) {
                    Ok(Some(PushMessage::NewDetection(detection))) => {
                        if let Err(e) = self.dashboard.handle_new_detection(detection).await {
                            tracing::error!(error = %e, "Refresh after push failed");
                        }
                    }
                    Ok(None) => tracing::debug!(event = %name, "Ignoring push event"),
                    Err(e) => {
                        tracing::warn!(event = %name, error = %e, "Invalid push event payload");
                    }
                }
                FrameAction::Continue
            }
        }
    }
}
