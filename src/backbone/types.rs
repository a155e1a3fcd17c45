//! Datentypen des Call-Backbones
//!
//! Diese Strukturen spiegeln die Objekte wider, die das Daily Call-Objekt
//! in seinen Events und Rückgabewerten liefert. Feldnamen bleiben über
//! `serde(rename)` mit dem Daily-Format kompatibel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// DEVICES
// ============================================================================

/// Geräteklasse wie vom Backbone gemeldet
///
/// Auf Mobilgeräten meldet Daily Mikrofone und Lautsprecher gemeinsam als `audio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    VideoInput,
    Audio,
    AudioInput,
    AudioOutput,
    /// Jede andere Geräteklasse; weder Kamera, Mikrofon noch Lautsprecher
    #[serde(other)]
    Other,
}

/// Beschreibung eines Media-Geräts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceInfo {
    pub device_id: String,
    #[serde(default)]
    pub group_id: String,
    pub kind: DeviceKind,
    #[serde(default)]
    pub label: String,
}

impl MediaDeviceInfo {
    pub fn new(device_id: impl Into<String>, kind: DeviceKind, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            group_id: String::new(),
            kind,
            label: label.into(),
        }
    }

    pub fn is_camera(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }

    pub fn is_microphone(&self) -> bool {
        matches!(self.kind, DeviceKind::Audio | DeviceKind::AudioInput)
    }

    pub fn is_speaker(&self) -> bool {
        matches!(self.kind, DeviceKind::Audio | DeviceKind::AudioOutput)
    }
}

/// Aktuell ausgewählte Geräte (Kamera, Mikrofon, Lautsprecher)
///
/// Jedes Feld ist `None`, solange das Backbone kein konkretes Gerät meldet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelection {
    #[serde(default, deserialize_with = "empty_object_as_none")]
    pub camera: Option<MediaDeviceInfo>,
    #[serde(default, deserialize_with = "empty_object_as_none")]
    pub mic: Option<MediaDeviceInfo>,
    #[serde(default, deserialize_with = "empty_object_as_none")]
    pub speaker: Option<MediaDeviceInfo>,
}

/// Daily meldet "kein Gerät" als leeres Objekt `{}`
fn empty_object_as_none<'de, D>(deserializer: D) -> Result<Option<MediaDeviceInfo>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(other) => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// TRACKS
// ============================================================================

/// Medienart eines Tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Handle auf einen persistenten Media-Track des Backbones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    pub id: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub label: String,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: String::new(),
        }
    }
}

/// Track-Typ innerhalb eines Teilnehmers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackType {
    Audio,
    Video,
    ScreenAudio,
    ScreenVideo,
    /// z.B. `rmpAudio` oder benutzerdefinierte Tracks
    #[serde(other)]
    Other,
}

impl TrackType {
    pub fn is_screen(self) -> bool {
        matches!(self, TrackType::ScreenAudio | TrackType::ScreenVideo)
    }
}

/// Persistente Tracks eines Teilnehmers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantTracks {
    #[serde(default)]
    pub audio: Option<MediaTrack>,
    #[serde(default)]
    pub video: Option<MediaTrack>,
    #[serde(default)]
    pub screen_audio: Option<MediaTrack>,
    #[serde(default)]
    pub screen_video: Option<MediaTrack>,
}

// ============================================================================
// PARTICIPANTS
// ============================================================================

/// Teilnehmer-Datensatz des Backbones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyParticipant {
    pub session_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub tracks: ParticipantTracks,
}

impl DailyParticipant {
    pub fn new(session_id: impl Into<String>, user_name: impl Into<String>, local: bool) -> Self {
        let session_id = session_id.into();
        Self {
            user_id: session_id.clone(),
            session_id,
            user_name: user_name.into(),
            local,
            tracks: ParticipantTracks::default(),
        }
    }
}

/// Momentaufnahme aller Teilnehmer einer Session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantRoster {
    pub local: Option<DailyParticipant>,
    pub remote: HashMap<String, DailyParticipant>,
}

impl ParticipantRoster {
    /// Fügt einen Teilnehmer hinzu (lokal oder remote)
    pub fn insert(&mut self, participant: DailyParticipant) {
        if participant.local {
            self.local = Some(participant);
        } else {
            self.remote
                .insert(participant.session_id.clone(), participant);
        }
    }

    /// Sucht einen Teilnehmer anhand seiner Session-ID
    pub fn get(&self, session_id: &str) -> Option<&DailyParticipant> {
        match &self.local {
            Some(local) if local.session_id == session_id => Some(local),
            _ => self.remote.get(session_id),
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// Raum-Konfiguration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Ablaufzeit als Unix-Sekunden
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Raum-Metadaten nach dem Join
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub config: RoomConfig,
}

impl RoomInfo {
    /// Ablaufzeitpunkt der Session, nur wenn der Raum eine ID und `exp` meldet
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.id.as_ref()?;
        DateTime::from_timestamp(self.config.exp?, 0)
    }
}

/// Parameter für den Join
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinOptions {
    pub url: String,
    pub token: String,
}

/// Optionen beim Erzeugen eines Call-Objekts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOptions {
    pub start_video_off: bool,
    pub start_audio_off: bool,
    pub allow_multiple_call_instances: bool,
}

/// Empfänger einer App-Message
///
/// RTVI-Nachrichten gehen immer an alle Teilnehmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMessageRecipient {
    /// Alle Teilnehmer (`*`)
    All,
}

impl AppMessageRecipient {
    pub fn as_str(self) -> &'static str {
        match self {
            AppMessageRecipient::All => "*",
        }
    }
}
