//! RTVI Message Envelope
//!
//! Alle Steuer-Nachrichten laufen als `{ id, type, data, label }` über den
//! Data-Channel des Backbones. Nur Nachrichten mit dem reservierten Label
//! gehören zum Protokoll.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserviertes Label für RTVI-Nachrichten
pub const RTVI_MESSAGE_LABEL: &str = "rtvi-ai";

/// Typ der Ready-Nachricht des Clients
pub const CLIENT_READY_MESSAGE_TYPE: &str = "client-ready";

fn default_label() -> String {
    RTVI_MESSAGE_LABEL.to_string()
}

/// Envelope einer RTVI-Nachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtviMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default = "default_label")]
    pub label: String,
}

impl RtviMessage {
    /// Erstellt eine neue Nachricht mit zufälliger ID
    pub fn new(msg_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            msg_type: msg_type.into(),
            data,
            label: default_label(),
        }
    }

    /// Ready-Handshake des Clients
    pub fn client_ready() -> Self {
        Self::new(CLIENT_READY_MESSAGE_TYPE, serde_json::json!({}))
    }

    /// Liest eine eingehende App-Message
    ///
    /// `Ok(None)` wenn das Label nicht `rtvi-ai` ist.
    pub fn from_app_message(data: &serde_json::Value) -> Result<Option<Self>, serde_json::Error> {
        let label = data.get("label").and_then(|l| l.as_str());
        if label != Some(RTVI_MESSAGE_LABEL) {
            return Ok(None);
        }
        serde_json::from_value(data.clone()).map(Some)
    }
}
