//! WebSocket connection to the backend's push channel.
//!
//! [`PushClient`] holds the endpoint; [`PushClient::connect`] opens a
//! live [`PushConnection`]. Frame handling lives in [`crate::bridge`].

use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Socket.IO path and query selecting the v4 WebSocket transport.
pub const SOCKET_IO_PATH: &str = "/socket.io/?EIO=4&transport=websocket";

pub type PushStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Derive the push endpoint from the backend's HTTP base URL.
///
/// `http` becomes `ws` and `https` becomes `wss`; a URL without a scheme
/// is treated as plain HTTP.
pub fn push_url_from_api(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        format!("ws://{base}")
    };
    format!("{ws_base}{SOCKET_IO_PATH}")
}

/// Connection settings for the push channel.
pub struct PushClient {
    push_url: String,
}

/// A live push connection.
pub struct PushConnection {
    pub ws_stream: PushStream,
}

impl PushClient {
    pub fn new(push_url: impl Into<String>) -> Self {
        Self {
            push_url: push_url.into(),
        }
    }

    pub fn push_url(&self) -> &str {
        &self.push_url
    }

    /// Open the WebSocket. The Socket.IO handshake is driven by the
    /// bridge once frames start arriving.
    pub async fn connect(&self) -> Result<PushConnection, PushError> {
        let (ws_stream, _response) = connect_async(self.push_url.as_str()).await.map_err(|e| {
            PushError::Connection(format!(
                "Failed to connect to push channel at {}: {e}",
                self.push_url
            ))
        })?;

        tracing::info!(push_url = %self.push_url, "Connected to push channel");

        Ok(PushConnection { ws_stream })
    }
}

/// Errors on the push channel.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The WebSocket could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The peer sent something the bridge cannot continue with.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
