//! Event-Übersetzung Backbone → RTVI
//!
//! Statische Zuordnung von Backbone-Event zu Callback(s). Die Reihenfolge
//! der Callbacks entspricht der Reihenfolge der eingehenden Events.

use super::transport::{ReadyHandshake, TransportInner};
use crate::backbone::{
    BackboneEvent, DailyParticipant, DeviceSelection, MediaDeviceInfo, NonFatalErrorKind,
    TrackEvent,
};
use crate::rtvi::{Participant, RtviMessage, TransportState};
use std::collections::BTreeMap;

impl From<&DailyParticipant> for Participant {
    fn from(p: &DailyParticipant) -> Self {
        Self {
            id: p.user_id.clone(),
            name: p.user_name.clone(),
            local: p.local,
        }
    }
}

/// Übernimmt `incoming`, falls sich die Device-ID geändert hat
///
/// Gibt das neue Gerät zurück, wenn ein Callback fällig ist.
fn replace_if_changed(
    slot: &mut Option<MediaDeviceInfo>,
    incoming: Option<MediaDeviceInfo>,
) -> Option<MediaDeviceInfo> {
    let current_id = slot.as_ref().map(|d| d.device_id.as_str());
    let incoming_id = incoming.as_ref().map(|d| d.device_id.as_str());
    if current_id == incoming_id {
        return None;
    }
    *slot = incoming.clone();
    incoming
}

impl TransportInner {
    /// Übersetzt ein Backbone-Event in RTVI-Callbacks
    pub(super) fn handle_event(&self, event: BackboneEvent) {
        tracing::trace!("[RTVI Transport] Backbone event: {}", event.action());

        match event {
            BackboneEvent::AvailableDevicesUpdated { available_devices } => {
                self.handle_available_devices_updated(available_devices)
            }
            BackboneEvent::SelectedDevicesUpdated { devices } => {
                self.handle_selected_devices_updated(devices)
            }
            BackboneEvent::TrackStarted(ev) => self.handle_track_started(ev),
            BackboneEvent::TrackStopped(ev) => self.handle_track_stopped(ev),
            BackboneEvent::ParticipantJoined { participant } => {
                self.handle_participant_joined(participant)
            }
            BackboneEvent::ParticipantLeft { participant } => {
                self.handle_participant_left(participant)
            }
            BackboneEvent::LocalAudioLevel { audio_level } => {
                self.callbacks().on_local_audio_level(audio_level)
            }
            BackboneEvent::RemoteParticipantsAudioLevel {
                participants_audio_level,
            } => self.handle_remote_audio_level(participants_audio_level),
            BackboneEvent::AppMessage { data, from_id } => self.handle_app_message(data, from_id),
            BackboneEvent::LeftMeeting => self.handle_left_meeting(),
            BackboneEvent::NonfatalError { kind, error_msg } => {
                self.handle_nonfatal_error(kind, error_msg)
            }
        }
    }

    fn handle_available_devices_updated(&self, devices: Vec<MediaDeviceInfo>) {
        let (cams, mics): (Vec<_>, Vec<_>) = devices
            .into_iter()
            .filter(|d| d.is_camera() || d.is_microphone())
            .partition(|d| d.is_camera());

        let callbacks = self.callbacks();
        callbacks.on_available_cams_updated(&cams);
        callbacks.on_available_mics_updated(&mics);
    }

    fn handle_selected_devices_updated(&self, devices: DeviceSelection) {
        let (cam, mic, speaker) = {
            let mut selected = self.selected.lock();
            (
                replace_if_changed(&mut selected.camera, devices.camera),
                replace_if_changed(&mut selected.mic, devices.mic),
                replace_if_changed(&mut selected.speaker, devices.speaker),
            )
        };

        let callbacks = self.callbacks();
        if let Some(cam) = cam {
            callbacks.on_cam_updated(&cam);
        }
        if let Some(mic) = mic {
            callbacks.on_mic_updated(&mic);
        }
        if let Some(speaker) = speaker {
            callbacks.on_speaker_updated(&speaker);
        }
    }

    fn handle_track_started(&self, ev: TrackEvent) {
        let participant = ev.participant.as_ref().map(Participant::from);
        let callbacks = self.callbacks();
        if ev.track_type.is_screen() {
            callbacks.on_screen_track_started(&ev.track, participant.as_ref());
        } else {
            callbacks.on_track_started(&ev.track, participant.as_ref());
        }

        // Ein Track ohne Teilnehmer zählt als remote
        let is_remote = ev.participant.as_ref().map_or(true, |p| !p.local);
        if is_remote {
            self.complete_ready_handshake();
        }
    }

    fn handle_track_stopped(&self, ev: TrackEvent) {
        let participant = ev.participant.as_ref().map(Participant::from);
        let callbacks = self.callbacks();
        if ev.track_type.is_screen() {
            callbacks.on_screen_track_stopped(&ev.track, participant.as_ref());
        } else {
            callbacks.on_track_stopped(&ev.track, participant.as_ref());
        }
    }

    fn handle_participant_joined(&self, participant: DailyParticipant) {
        let p = Participant::from(&participant);
        let callbacks = self.callbacks();

        callbacks.on_participant_joined(&p);

        if p.local {
            return;
        }

        // Der erste Remote-Teilnehmer ist der Bot
        let became_bot = {
            let mut bot_id = self.bot_id.lock();
            if bot_id.is_none() {
                *bot_id = Some(participant.session_id.clone());
                true
            } else {
                false
            }
        };

        if became_bot {
            callbacks.on_bot_connected(&p);
        } else {
            tracing::debug!(
                "[RTVI Transport] Bot already connected, ignoring remote participant {}",
                participant.session_id
            );
        }
    }

    fn handle_participant_left(&self, participant: DailyParticipant) {
        let p = Participant::from(&participant);
        let callbacks = self.callbacks();

        callbacks.on_participant_left(&p);

        if p.local {
            return;
        }

        let was_bot = {
            let mut bot_id = self.bot_id.lock();
            if bot_id.as_deref() == Some(participant.session_id.as_str()) {
                *bot_id = None;
                true
            } else {
                false
            }
        };

        if was_bot {
            callbacks.on_bot_disconnected(&p);
        }
    }

    fn handle_remote_audio_level(&self, levels: BTreeMap<String, Option<f64>>) {
        let Some(call) = self.call.read().clone() else {
            return;
        };
        let roster = call.participants();
        let callbacks = self.callbacks();

        for (session_id, level) in levels {
            let Some(level) = level else { continue };
            if let Some(participant) = roster.get(&session_id) {
                callbacks.on_remote_audio_level(level, &Participant::from(participant));
            }
        }
    }

    fn handle_app_message(&self, data: serde_json::Value, from_id: String) {
        let message = match RtviMessage::from_app_message(&data) {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(
                    "[RTVI Transport] Dropping malformed RTVI message from {}: {}",
                    from_id,
                    e
                );
                return;
            }
        };

        let handler = self.on_message.read().clone();
        match handler {
            Some(handler) => handler(message),
            None => tracing::warn!("[RTVI Transport] No message handler registered"),
        }
    }

    fn handle_left_meeting(&self) {
        self.set_state(TransportState::Disconnected);
        self.reset_session();
        self.callbacks().on_disconnected();
    }

    fn handle_nonfatal_error(&self, kind: NonFatalErrorKind, error_msg: String) {
        match kind {
            NonFatalErrorKind::ScreenShareError => {
                self.callbacks().on_screen_share_error(&error_msg)
            }
            other => {
                tracing::debug!(
                    "[RTVI Transport] Ignoring nonfatal error {:?}: {}",
                    other,
                    error_msg
                );
            }
        }
    }

    /// Schließt einen wartenden Ready-Handshake ab (einmal pro Session)
    ///
    /// Wartende Aufrufe werden erst nach dem Senden von `client-ready` erfüllt.
    fn complete_ready_handshake(&self) {
        {
            let mut ready = self.ready.lock();
            match std::mem::take(&mut *ready) {
                ReadyHandshake::Waiting(waiters) => *ready = ReadyHandshake::Sending(waiters),
                other => {
                    *ready = other;
                    return;
                }
            }
        }

        self.set_state(TransportState::Ready);
        if let Err(e) = self.send_message(&RtviMessage::client_ready()) {
            tracing::error!("[RTVI Transport] Failed to send client-ready: {}", e);
        }

        let waiters = {
            let mut ready = self.ready.lock();
            match std::mem::take(&mut *ready) {
                ReadyHandshake::Sending(waiters) => {
                    *ready = ReadyHandshake::Sent;
                    waiters
                }
                // Session wurde inzwischen zurückgesetzt
                other => {
                    *ready = other;
                    return;
                }
            }
        };

        for waiter in waiters {
            let _ = waiter.send(());
        }
    }
}
