//! Call-Objekt Schnittstelle
//!
//! Der Transport spricht das Backbone ausschließlich über diese Traits an.
//! Media-Transport, Codecs und Netzwerk bleiben vollständig beim Backbone.

use super::events::BackboneEvent;
use super::types::{
    AppMessageRecipient, CallOptions, DeviceSelection, JoinOptions, MediaDeviceInfo,
    ParticipantRoster, RoomInfo,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackboneError {
    /// Das Backbone hat den Aufruf abgelehnt (Nachricht unverändert)
    #[error("{0}")]
    Rejected(String),

    #[error("Device not available: {0}")]
    DeviceUnavailable(String),

    #[error("Audio level observer failed: {0}")]
    Observer(String),

    #[error("Call object has been destroyed")]
    Destroyed,
}

// ============================================================================
// CALL BACKBONE
// ============================================================================

/// Ein einzelnes Call-Objekt (eine Session)
#[async_trait]
pub trait CallBackbone: Send + Sync {
    /// Gibt einen Event-Receiver zurück
    fn subscribe(&self) -> broadcast::Receiver<BackboneEvent>;

    // Session
    async fn join(&self, options: JoinOptions) -> Result<(), BackboneError>;
    async fn leave(&self) -> Result<(), BackboneError>;
    async fn destroy(&self) -> Result<(), BackboneError>;
    async fn room(&self) -> Result<Option<RoomInfo>, BackboneError>;
    fn participants(&self) -> ParticipantRoster;

    // Geräte
    async fn start_camera(&self) -> Result<(), BackboneError>;
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, BackboneError>;
    async fn get_input_devices(&self) -> Result<DeviceSelection, BackboneError>;
    async fn set_camera(&self, device_id: &str) -> Result<(), BackboneError>;
    async fn set_audio_device(&self, device_id: &str) -> Result<(), BackboneError>;

    // Lokale Medien
    fn set_local_audio(&self, enable: bool) -> Result<(), BackboneError>;
    fn set_local_video(&self, enable: bool) -> Result<(), BackboneError>;
    fn local_audio(&self) -> bool;
    fn local_video(&self) -> bool;
    fn local_screen_audio(&self) -> bool;
    fn local_screen_video(&self) -> bool;
    fn start_screen_share(&self) -> Result<(), BackboneError>;
    fn stop_screen_share(&self) -> Result<(), BackboneError>;

    // Audio-Level Observer
    fn is_local_audio_level_observer_running(&self) -> bool;
    fn is_remote_participants_audio_level_observer_running(&self) -> bool;
    async fn start_local_audio_level_observer(
        &self,
        interval: Duration,
    ) -> Result<(), BackboneError>;
    async fn start_remote_participants_audio_level_observer(
        &self,
        interval: Duration,
    ) -> Result<(), BackboneError>;
    fn stop_local_audio_level_observer(&self) -> Result<(), BackboneError>;
    fn stop_remote_participants_audio_level_observer(&self) -> Result<(), BackboneError>;

    /// Sendet Anwendungsdaten über den Data-Channel
    fn send_app_message(
        &self,
        data: serde_json::Value,
        to: AppMessageRecipient,
    ) -> Result<(), BackboneError>;
}

// ============================================================================
// CALL FACTORY
// ============================================================================

/// Erzeugt Call-Objekte und kennt das aktuell lebende
///
/// Wird dem Transport explizit übergeben; das Backbone erlaubt nur ein
/// aktives Call-Objekt gleichzeitig.
pub trait CallFactory: Send + Sync {
    /// Das aktuell lebende Call-Objekt, falls vorhanden
    fn current_instance(&self) -> Option<Arc<dyn CallBackbone>>;

    /// Erstellt ein neues Call-Objekt
    fn create_call_object(
        &self,
        options: CallOptions,
    ) -> Result<Arc<dyn CallBackbone>, BackboneError>;
}
