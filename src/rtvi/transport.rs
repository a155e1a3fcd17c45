//! Transport-Vertrag des RTVI Clients
//!
//! Der Client erzeugt einen Transport, ruft `initialize` auf und steuert
//! danach Geräte, Verbindung und Nachrichten ausschließlich über diesen Trait.

use super::callbacks::TransportCallbacks;
use super::error::TransportError;
use super::messages::RtviMessage;
use crate::backbone::{MediaDeviceInfo, MediaTrack};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// TRANSPORT STATE
// ============================================================================

/// Verbindungsstatus des Transports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    #[default]
    Disconnected,
    Initializing,
    Initialized,
    Connecting,
    Connected,
    /// Bot-Medien laufen, Ready-Handshake gesendet
    Ready,
    Error,
}

impl TransportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportState::Disconnected => "disconnected",
            TransportState::Initializing => "initializing",
            TransportState::Initialized => "initialized",
            TransportState::Connecting => "connecting",
            TransportState::Connected => "connected",
            TransportState::Ready => "ready",
            TransportState::Error => "error",
        }
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PARTICIPANTS & TRACKS
// ============================================================================

/// Teilnehmer aus Sicht des Clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub local: bool,
}

/// Tracks des lokalen Teilnehmers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalTracks {
    pub audio: Option<MediaTrack>,
    pub screen_audio: Option<MediaTrack>,
    pub screen_video: Option<MediaTrack>,
    pub video: Option<MediaTrack>,
}

/// Tracks des Bots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotTracks {
    pub audio: Option<MediaTrack>,
    pub video: Option<MediaTrack>,
}

/// Momentaufnahme aller bekannten Tracks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracks {
    pub local: LocalTracks,
    pub bot: Option<BotTracks>,
}

// ============================================================================
// CLIENT OPTIONS
// ============================================================================

/// Handler für eingehende RTVI-Nachrichten
pub type MessageHandler = Arc<dyn Fn(RtviMessage) + Send + Sync>;

/// Optionen, mit denen der Client den Transport initialisiert
#[derive(Clone, Default)]
pub struct RtviClientOptions {
    pub callbacks: Option<Arc<dyn TransportCallbacks>>,
    pub enable_mic: Option<bool>,
    pub enable_cam: Option<bool>,
}

impl std::fmt::Debug for RtviClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtviClientOptions")
            .field("callbacks", &self.callbacks.is_some())
            .field("enable_mic", &self.enable_mic)
            .field("enable_cam", &self.enable_cam)
            .finish()
    }
}

// ============================================================================
// TRANSPORT TRAIT
// ============================================================================

#[async_trait]
pub trait Transport: Send + Sync {
    /// Zugangsdaten für `connect`
    type AuthBundle: Send + 'static;

    /// Späte Initialisierung: Callbacks, Message-Handler und Session-Handle
    async fn initialize(
        &self,
        options: RtviClientOptions,
        message_handler: MessageHandler,
    ) -> Result<(), TransportError>;

    fn state(&self) -> TransportState;

    async fn initialize_devices(&self) -> Result<(), TransportError>;

    async fn connect(
        &self,
        auth_bundle: Self::AuthBundle,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Wartet auf den nächsten Remote-Track und sendet dann `client-ready`
    async fn send_ready_message(&self) -> Result<(), TransportError>;

    fn send_message(&self, message: &RtviMessage) -> Result<(), TransportError>;

    // Geräte
    async fn get_all_cams(&self) -> Result<Vec<MediaDeviceInfo>, TransportError>;
    async fn get_all_mics(&self) -> Result<Vec<MediaDeviceInfo>, TransportError>;
    async fn get_all_speakers(&self) -> Result<Vec<MediaDeviceInfo>, TransportError>;
    async fn update_cam(&self, cam_id: &str) -> Result<(), TransportError>;
    async fn update_mic(&self, mic_id: &str) -> Result<(), TransportError>;
    async fn update_speaker(&self, speaker_id: &str) -> Result<(), TransportError>;
    fn selected_cam(&self) -> Option<MediaDeviceInfo>;
    fn selected_mic(&self) -> Option<MediaDeviceInfo>;
    fn selected_speaker(&self) -> Option<MediaDeviceInfo>;

    // Lokale Medien
    fn enable_mic(&self, enable: bool) -> Result<(), TransportError>;
    fn enable_cam(&self, enable: bool) -> Result<(), TransportError>;
    fn enable_screen_share(&self, enable: bool) -> Result<(), TransportError>;
    fn is_mic_enabled(&self) -> bool;
    fn is_cam_enabled(&self) -> bool;
    fn is_sharing_screen(&self) -> bool;

    fn tracks(&self) -> Tracks;

    /// Ablaufzeit der Session, falls vom Raum gemeldet
    fn expiry(&self) -> Option<DateTime<Utc>>;
}
