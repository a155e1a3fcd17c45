//! Callback-Vertrag des RTVI Clients
//!
//! Der Transport ruft genau diese Callbacks auf. Alle Methoden haben eine
//! leere Default-Implementierung, der Client überschreibt nur was er braucht.

use super::messages::RtviMessage;
use super::transport::{Participant, TransportState};
use crate::backbone::{MediaDeviceInfo, MediaTrack};
use tokio::sync::broadcast;

// ============================================================================
// CALLBACK TRAIT
// ============================================================================

#[allow(unused_variables)]
pub trait TransportCallbacks: Send + Sync {
    fn on_transport_state_changed(&self, state: TransportState) {}

    fn on_connected(&self) {}
    fn on_disconnected(&self) {}

    fn on_bot_connected(&self, participant: &Participant) {}
    fn on_bot_disconnected(&self, participant: &Participant) {}
    fn on_participant_joined(&self, participant: &Participant) {}
    fn on_participant_left(&self, participant: &Participant) {}

    fn on_track_started(&self, track: &MediaTrack, participant: Option<&Participant>) {}
    fn on_track_stopped(&self, track: &MediaTrack, participant: Option<&Participant>) {}
    fn on_screen_track_started(&self, track: &MediaTrack, participant: Option<&Participant>) {}
    fn on_screen_track_stopped(&self, track: &MediaTrack, participant: Option<&Participant>) {}

    fn on_available_cams_updated(&self, cams: &[MediaDeviceInfo]) {}
    fn on_available_mics_updated(&self, mics: &[MediaDeviceInfo]) {}
    fn on_cam_updated(&self, cam: &MediaDeviceInfo) {}
    fn on_mic_updated(&self, mic: &MediaDeviceInfo) {}
    fn on_speaker_updated(&self, speaker: &MediaDeviceInfo) {}

    fn on_local_audio_level(&self, level: f64) {}
    fn on_remote_audio_level(&self, level: f64, participant: &Participant) {}

    fn on_screen_share_error(&self, error_message: &str) {}
    fn on_error(&self, message: &RtviMessage) {}
}

/// Callbacks ohne Wirkung (Default wenn der Client keine angibt)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl TransportCallbacks for NoopCallbacks {}

// ============================================================================
// EVENT CALLBACKS
// ============================================================================

/// Events, die [`EventCallbacks`] veröffentlicht
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    StateChanged(TransportState),
    Connected,
    Disconnected,
    BotConnected(Participant),
    BotDisconnected(Participant),
    ParticipantJoined(Participant),
    ParticipantLeft(Participant),
    TrackStarted {
        track: MediaTrack,
        participant: Option<Participant>,
    },
    TrackStopped {
        track: MediaTrack,
        participant: Option<Participant>,
    },
    ScreenTrackStarted {
        track: MediaTrack,
        participant: Option<Participant>,
    },
    ScreenTrackStopped {
        track: MediaTrack,
        participant: Option<Participant>,
    },
    AvailableCamsUpdated(Vec<MediaDeviceInfo>),
    AvailableMicsUpdated(Vec<MediaDeviceInfo>),
    CamUpdated(MediaDeviceInfo),
    MicUpdated(MediaDeviceInfo),
    SpeakerUpdated(MediaDeviceInfo),
    LocalAudioLevel(f64),
    RemoteAudioLevel {
        level: f64,
        participant: Participant,
    },
    ScreenShareError(String),
    Error(RtviMessage),
}

/// Leitet jeden Callback als [`TransportEvent`] auf einen Broadcast-Kanal
pub struct EventCallbacks {
    event_tx: broadcast::Sender<TransportEvent>,
}

impl EventCallbacks {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self { event_tx }
    }

    /// Gibt einen Event-Receiver zurück
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: TransportEvent) {
        // Ohne Receiver gibt es niemanden zu benachrichtigen
        let _ = self.event_tx.send(event);
    }
}

impl Default for EventCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCallbacks")
            .field("receivers", &self.event_tx.receiver_count())
            .finish()
    }
}

impl TransportCallbacks for EventCallbacks {
    fn on_transport_state_changed(&self, state: TransportState) {
        self.emit(TransportEvent::StateChanged(state));
    }

    fn on_connected(&self) {
        self.emit(TransportEvent::Connected);
    }

    fn on_disconnected(&self) {
        self.emit(TransportEvent::Disconnected);
    }

    fn on_bot_connected(&self, participant: &Participant) {
        self.emit(TransportEvent::BotConnected(participant.clone()));
    }

    fn on_bot_disconnected(&self, participant: &Participant) {
        self.emit(TransportEvent::BotDisconnected(participant.clone()));
    }

    fn on_participant_joined(&self, participant: &Participant) {
        self.emit(TransportEvent::ParticipantJoined(participant.clone()));
    }

    fn on_participant_left(&self, participant: &Participant) {
        self.emit(TransportEvent::ParticipantLeft(participant.clone()));
    }

    fn on_track_started(&self, track: &MediaTrack, participant: Option<&Participant>) {
        self.emit(TransportEvent::TrackStarted {
            track: track.clone(),
            participant: participant.cloned(),
        });
    }

    fn on_track_stopped(&self, track: &MediaTrack, participant: Option<&Participant>) {
        self.emit(TransportEvent::TrackStopped {
            track: track.clone(),
            participant: participant.cloned(),
        });
    }

    fn on_screen_track_started(&self, track: &MediaTrack, participant: Option<&Participant>) {
        self.emit(TransportEvent::ScreenTrackStarted {
            track: track.clone(),
            participant: participant.cloned(),
        });
    }

    fn on_screen_track_stopped(&self, track: &MediaTrack, participant: Option<&Participant>) {
        self.emit(TransportEvent::ScreenTrackStopped {
            track: track.clone(),
            participant: participant.cloned(),
        });
    }

    fn on_available_cams_updated(&self, cams: &[MediaDeviceInfo]) {
        self.emit(TransportEvent::AvailableCamsUpdated(cams.to_vec()));
    }

    fn on_available_mics_updated(&self, mics: &[MediaDeviceInfo]) {
        self.emit(TransportEvent::AvailableMicsUpdated(mics.to_vec()));
    }

    fn on_cam_updated(&self, cam: &MediaDeviceInfo) {
        self.emit(TransportEvent::CamUpdated(cam.clone()));
    }

    fn on_mic_updated(&self, mic: &MediaDeviceInfo) {
        self.emit(TransportEvent::MicUpdated(mic.clone()));
    }

    fn on_speaker_updated(&self, speaker: &MediaDeviceInfo) {
        self.emit(TransportEvent::SpeakerUpdated(speaker.clone()));
    }

    fn on_local_audio_level(&self, level: f64) {
        self.emit(TransportEvent::LocalAudioLevel(level));
    }

    fn on_remote_audio_level(&self, level: f64, participant: &Participant) {
        self.emit(TransportEvent::RemoteAudioLevel {
            level,
            participant: participant.clone(),
        });
    }

    fn on_screen_share_error(&self, error_message: &str) {
        self.emit(TransportEvent::ScreenShareError(error_message.to_string()));
    }

    fn on_error(&self, message: &RtviMessage) {
        self.emit(TransportEvent::Error(message.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_reach_subscriber() {
        let callbacks = EventCallbacks::new();
        let mut rx = callbacks.subscribe();

        callbacks.on_transport_state_changed(TransportState::Connecting);
        callbacks.on_local_audio_level(0.25);

        assert_eq!(
            rx.try_recv().unwrap(),
            TransportEvent::StateChanged(TransportState::Connecting)
        );
        assert_eq!(rx.try_recv().unwrap(), TransportEvent::LocalAudioLevel(0.25));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_without_subscriber_is_harmless() {
        let callbacks = EventCallbacks::new();
        callbacks.on_connected();
        callbacks.on_screen_share_error("denied");
    }
}
