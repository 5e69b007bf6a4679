//! Notification API types and the push frame format.
//!
//! The push stream carries one JSON object per frame, dispatched on its
//! `"type"` field:
//!
//! ```json
//! {"type":"unread_count","count":7}
//! {"type":"connected"}
//! {"type":"order_shipped","id":12,"title":"Shipped","message":"...","priority":"high"}
//! ```
//!
//! Anything that is not one of the first two shapes and still parses as a
//! [`Notification`] is a new notification. Empty frames, keep-alives and
//! malformed payloads decode to nothing.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use super::string_or_number;

/// Payload prefixes servers use for keep-alive frames.
pub const HEARTBEAT_PREFIXES: &[&str] = &[":", "heartbeat", "ping"];

/// Identifier of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NotificationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_number(deserializer).map(NotificationId)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// A notification as pushed by the server or listed by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub id: Option<NotificationId>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub link: Option<String>,
}

/// A decoded push frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
    /// Authoritative unread counter, replaces whatever the client holds.
    UnreadCount { count: u64 },
    /// Server hello sent right after the stream opens.
    Connected,
    Notification(Notification),
}

impl PushFrame {
    /// Decode one raw frame payload.
    ///
    /// Returns `None` for anything that must be ignored: empty payloads,
    /// heartbeats, non-JSON text, JSON that is not an object, and objects
    /// that are neither a counter update nor a notification.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || is_heartbeat(raw) {
            return None;
        }

        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        let object = value.as_object()?;

        match object.get("type").and_then(serde_json::Value::as_str) {
            Some("unread_count") => {
                let count = object.get("count").and_then(serde_json::Value::as_u64)?;
                Some(PushFrame::UnreadCount { count })
            }
            Some("connected") => Some(PushFrame::Connected),
            Some("heartbeat" | "ping") => None,
            _ => serde_json::from_value::<Notification>(value)
                .ok()
                .map(PushFrame::Notification),
        }
    }
}

fn is_heartbeat(raw: &str) -> bool {
    HEARTBEAT_PREFIXES
        .iter()
        .any(|prefix| raw.starts_with(prefix))
}

/// `GET /api/notifications/unread-count` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}
