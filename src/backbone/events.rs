//! Events des Call-Backbones
//!
//! Jede Variante entspricht genau einem Event, das der Transport beim
//! Initialisieren abonniert. Das `action`-Feld trägt den Daily-Eventnamen.

use super::types::{DailyParticipant, DeviceSelection, MediaDeviceInfo, MediaTrack, TrackType};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Payload von `track-started` / `track-stopped`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackEvent {
    pub track: MediaTrack,
    #[serde(rename = "type")]
    pub track_type: TrackType,
    #[serde(default)]
    pub participant: Option<DailyParticipant>,
}

/// Unterarten von `nonfatal-error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonFatalErrorKind {
    ScreenShareError,
    LocalAudioLevelObserverError,
    RemoteParticipantsAudioLevelObserverError,
    VideoProcessorError,
    AudioProcessorError,
    #[serde(other)]
    Other,
}

/// Alle abonnierten Backbone-Events
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum BackboneEvent {
    AvailableDevicesUpdated {
        #[serde(rename = "availableDevices")]
        available_devices: Vec<MediaDeviceInfo>,
    },

    SelectedDevicesUpdated {
        devices: DeviceSelection,
    },

    TrackStarted(TrackEvent),

    TrackStopped(TrackEvent),

    ParticipantJoined {
        participant: DailyParticipant,
    },

    ParticipantLeft {
        participant: DailyParticipant,
    },

    LocalAudioLevel {
        #[serde(rename = "audioLevel")]
        audio_level: f64,
    },

    RemoteParticipantsAudioLevel {
        /// Nach Session-ID geordnet
        #[serde(rename = "participantsAudioLevel")]
        participants_audio_level: BTreeMap<String, Option<f64>>,
    },

    AppMessage {
        data: serde_json::Value,
        #[serde(rename = "fromId", default)]
        from_id: String,
    },

    LeftMeeting,

    NonfatalError {
        #[serde(rename = "type")]
        kind: NonFatalErrorKind,
        #[serde(rename = "errorMsg", default)]
        error_msg: String,
    },
}

impl BackboneEvent {
    /// Daily-Eventname (für Logging)
    pub fn action(&self) -> &'static str {
        match self {
            BackboneEvent::AvailableDevicesUpdated { .. } => "available-devices-updated",
            BackboneEvent::SelectedDevicesUpdated { .. } => "selected-devices-updated",
            BackboneEvent::TrackStarted(_) => "track-started",
            BackboneEvent::TrackStopped(_) => "track-stopped",
            BackboneEvent::ParticipantJoined { .. } => "participant-joined",
            BackboneEvent::ParticipantLeft { .. } => "participant-left",
            BackboneEvent::LocalAudioLevel { .. } => "local-audio-level",
            BackboneEvent::RemoteParticipantsAudioLevel { .. } => "remote-participants-audio-level",
            BackboneEvent::AppMessage { .. } => "app-message",
            BackboneEvent::LeftMeeting => "left-meeting",
            BackboneEvent::NonfatalError { .. } => "nonfatal-error",
        }
    }
}
