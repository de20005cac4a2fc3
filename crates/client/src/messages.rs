//! Push channel frame types and parser.
//!
//! The backend pushes through Socket.IO v4 over a plain WebSocket. Each
//! text frame starts with an Engine.IO packet type digit; message packets
//! (`4`) carry a Socket.IO packet type digit, an optional `/namespace,`
//! prefix, an optional ack id and a JSON body. Events arrive as
//! `42["name", payload]`.

use serde_json::Value;
use shelfwatch_core::wire::NewDetection;

/// Event name the backend emits for each stored detection.
pub const NEW_DETECTION_EVENT: &str = "new_detection";

/// Frame sent to join the default namespace once the transport is open.
pub const NAMESPACE_CONNECT: &str = "40";

/// Reply to a server ping.
pub const PONG: &str = "3";

/// One decoded transport frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PushFrame {
    /// Engine.IO handshake (`0{...}`).
    Open { sid: Option<String>, ping_interval_ms: Option<u64> },
    /// Server closed the transport (`1`).
    Close,
    /// Heartbeat request (`2`); must be answered with [`PONG`].
    Ping,
    Pong,
    Noop,
    /// Namespace joined (`40`).
    Connected,
    /// Namespace left (`41`).
    Disconnected,
    /// Namespace join refused (`44`).
    ConnectError(String),
    /// Named event (`42`).
    Event { name: String, payload: Value },
    /// Packets the dashboard does not act on (acks, binary, upgrades).
    Ignored(char),
}

/// Events the dashboard reacts to.
#[derive(Debug, Clone)]
pub enum PushMessage {
    NewDetection(NewDetection),
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown packet type '{0}'")]
    UnknownType(char),

    #[error("Invalid frame body: {0}")]
    InvalidBody(String),
}

/// Parse one text frame.
pub fn parse_frame(text: &str) -> Result<PushFrame, FrameError> {
    let mut chars = text.chars();
    let engine = chars.next().ok_or(FrameError::Empty)?;
    let rest = chars.as_str();
    match engine {
        '0' => parse_open(rest),
        '1' => Ok(PushFrame::Close),
        '2' => Ok(PushFrame::Ping),
        '3' => Ok(PushFrame::Pong),
        '4' => parse_socket_packet(rest),
        '5' => Ok(PushFrame::Ignored('5')),
        '6' => Ok(PushFrame::Noop),
        other => Err(FrameError::UnknownType(other)),
    }
}

fn parse_open(body: &str) -> Result<PushFrame, FrameError> {
    if body.is_empty() {
        return Ok(PushFrame::Open {
            sid: None,
            ping_interval_ms: None,
        });
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| FrameError::InvalidBody(e.to_string()))?;
    Ok(PushFrame::Open {
        sid: value.get("sid").and_then(Value::as_str).map(str::to_string),
        ping_interval_ms: value.get("pingInterval").and_then(Value::as_u64),
    })
}

fn parse_socket_packet(rest: &str) -> Result<PushFrame, FrameError> {
    let mut chars = rest.chars();
    let packet = chars.next().ok_or(FrameError::Empty)?;
    let body = strip_ack_id(strip_namespace(chars.as_str()));
    match packet {
        '0' => Ok(PushFrame::Connected),
        '1' => Ok(PushFrame::Disconnected),
        '2' => parse_event(body),
        '4' => Ok(PushFrame::ConnectError(connect_error_message(body))),
        '3' | '5' | '6' => Ok(PushFrame::Ignored(packet)),
        other => Err(FrameError::UnknownType(other)),
    }
}

/// Drop a leading `/namespace,` if present.
fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.find(',') {
            Some(idx) => &body[idx + 1..],
            None => "",
        }
    } else {
        body
    }
}

/// Drop a leading numeric ack id.
fn strip_ack_id(body: &str) -> &str {
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn parse_event(body: &str) -> Result<PushFrame, FrameError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FrameError::InvalidBody(e.to_string()))?;
    let mut items = match value {
        Value::Array(items) => items.into_iter(),
        _ => return Err(FrameError::InvalidBody("event is not an array".to_string())),
    };
    let name = match items.next() {
        Some(Value::String(name)) => name,
        _ => return Err(FrameError::InvalidBody("event name missing".to_string())),
    };
    Ok(PushFrame::Event {
        name,
        payload: items.next().unwrap_or(Value::Null),
    })
}

fn connect_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Interpret a named event. Unknown names return `Ok(None)`.
pub fn parse_event_message(name: &str, payload: Value) -> Result<Option<PushMessage>, FrameError> {
    match name {
        NEW_DETECTION_EVENT => serde_json::from_value(payload)
            .map(|d| Some(PushMessage::NewDetection(d)))
            .map_err(|e| FrameError::InvalidBody(e.to_string())),
        _ => Ok(None),
    }
}
