//! In-Memory Backbone für Tests
//!
//! Protokolliert jeden Aufruf und erlaubt es, Events gezielt auszulösen.

use super::call::{BackboneError, CallBackbone, CallFactory};
use super::events::BackboneEvent;
use super::types::{
    AppMessageRecipient, CallOptions, DeviceSelection, JoinOptions, MediaDeviceInfo,
    ParticipantRoster, RoomInfo,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Steuerbarer Zustand eines [`FakeCall`]
#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub calls: Vec<String>,
    pub join_error: Option<String>,
    pub room: Option<RoomInfo>,
    pub devices: Vec<MediaDeviceInfo>,
    pub input_devices: DeviceSelection,
    pub roster: ParticipantRoster,
    pub local_audio: bool,
    pub local_video: bool,
    pub screen_audio: bool,
    pub screen_video: bool,
    pub local_observer_running: bool,
    pub remote_observer_running: bool,
    pub fail_stop_local_observer: bool,
    pub fail_set_camera: bool,
    pub emit_left_on_leave: bool,
    /// Wird während des Joins abgebrochen
    pub cancel_on_join: Option<CancellationToken>,
    pub sent: Vec<(serde_json::Value, AppMessageRecipient)>,
    pub destroyed: bool,
}

pub(crate) struct FakeCall {
    pub options: CallOptions,
    event_tx: broadcast::Sender<BackboneEvent>,
    state: Mutex<FakeState>,
}

impl FakeCall {
    pub fn new(options: CallOptions) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            options,
            event_tx,
            state: Mutex::new(FakeState {
                local_audio: !options.start_audio_off,
                local_video: !options.start_video_off,
                ..Default::default()
            }),
        }
    }

    /// Löst ein Backbone-Event aus
    pub fn emit(&self, event: BackboneEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn sent(&self) -> Vec<(serde_json::Value, AppMessageRecipient)> {
        self.state.lock().sent.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    fn record(&self, call: impl Into<String>) -> Result<(), BackboneError> {
        let mut state = self.state.lock();
        state.calls.push(call.into());
        if state.destroyed {
            return Err(BackboneError::Destroyed);
        }
        Ok(())
    }

    fn find_device(&self, device_id: &str) -> Result<MediaDeviceInfo, BackboneError> {
        self.state
            .lock()
            .devices
            .iter()
            .find(|d| d.device_id == device_id)
            .cloned()
            .ok_or_else(|| BackboneError::DeviceUnavailable(device_id.to_string()))
    }
}

#[async_trait]
impl CallBackbone for FakeCall {
    fn subscribe(&self) -> broadcast::Receiver<BackboneEvent> {
        self.event_tx.subscribe()
    }

    async fn join(&self, options: JoinOptions) -> Result<(), BackboneError> {
        self.record(format!("join:{}:{}", options.url, options.token))?;
        if let Some(token) = self.state.lock().cancel_on_join.clone() {
            token.cancel();
        }
        match self.state.lock().join_error.clone() {
            Some(message) => Err(BackboneError::Rejected(message)),
            None => Ok(()),
        }
    }

    async fn leave(&self) -> Result<(), BackboneError> {
        self.record("leave")?;
        if self.state.lock().emit_left_on_leave {
            self.emit(BackboneEvent::LeftMeeting);
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), BackboneError> {
        self.record("destroy")?;
        self.state.lock().destroyed = true;
        Ok(())
    }

    async fn room(&self) -> Result<Option<RoomInfo>, BackboneError> {
        self.record("room")?;
        Ok(self.state.lock().room.clone())
    }

    fn participants(&self) -> ParticipantRoster {
        self.state.lock().roster.clone()
    }

    async fn start_camera(&self) -> Result<(), BackboneError> {
        self.record("start_camera")
    }

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, BackboneError> {
        self.record("enumerate_devices")?;
        Ok(self.state.lock().devices.clone())
    }

    async fn get_input_devices(&self) -> Result<DeviceSelection, BackboneError> {
        self.record("get_input_devices")?;
        Ok(self.state.lock().input_devices.clone())
    }

    async fn set_camera(&self, device_id: &str) -> Result<(), BackboneError> {
        self.record(format!("set_camera:{}", device_id))?;
        if self.state.lock().fail_set_camera {
            return Err(BackboneError::Rejected("camera busy".to_string()));
        }
        let device = self.find_device(device_id)?;
        self.state.lock().input_devices.camera = Some(device);
        Ok(())
    }

    async fn set_audio_device(&self, device_id: &str) -> Result<(), BackboneError> {
        self.record(format!("set_audio_device:{}", device_id))?;
        let device = self.find_device(device_id)?;
        let mut state = self.state.lock();
        state.input_devices.mic = Some(device.clone());
        state.input_devices.speaker = Some(device);
        Ok(())
    }

    fn set_local_audio(&self, enable: bool) -> Result<(), BackboneError> {
        self.record(format!("set_local_audio:{}", enable))?;
        self.state.lock().local_audio = enable;
        Ok(())
    }

    fn set_local_video(&self, enable: bool) -> Result<(), BackboneError> {
        self.record(format!("set_local_video:{}", enable))?;
        self.state.lock().local_video = enable;
        Ok(())
    }

    fn local_audio(&self) -> bool {
        self.state.lock().local_audio
    }

    fn local_video(&self) -> bool {
        self.state.lock().local_video
    }

    fn local_screen_audio(&self) -> bool {
        self.state.lock().screen_audio
    }

    fn local_screen_video(&self) -> bool {
        self.state.lock().screen_video
    }

    fn start_screen_share(&self) -> Result<(), BackboneError> {
        self.record("start_screen_share")?;
        self.state.lock().screen_video = true;
        Ok(())
    }

    fn stop_screen_share(&self) -> Result<(), BackboneError> {
        self.record("stop_screen_share")?;
        let mut state = self.state.lock();
        state.screen_audio = false;
        state.screen_video = false;
        Ok(())
    }

    fn is_local_audio_level_observer_running(&self) -> bool {
        self.state.lock().local_observer_running
    }

    fn is_remote_participants_audio_level_observer_running(&self) -> bool {
        self.state.lock().remote_observer_running
    }

    async fn start_local_audio_level_observer(
        &self,
        interval: Duration,
    ) -> Result<(), BackboneError> {
        self.record(format!("start_local_observer:{}", interval.as_millis()))?;
        self.state.lock().local_observer_running = true;
        Ok(())
    }

    async fn start_remote_participants_audio_level_observer(
        &self,
        interval: Duration,
    ) -> Result<(), BackboneError> {
        self.record(format!("start_remote_observer:{}", interval.as_millis()))?;
        self.state.lock().remote_observer_running = true;
        Ok(())
    }

    fn stop_local_audio_level_observer(&self) -> Result<(), BackboneError> {
        self.record("stop_local_observer")?;
        let mut state = self.state.lock();
        if state.fail_stop_local_observer {
            return Err(BackboneError::Observer("not running".to_string()));
        }
        state.local_observer_running = false;
        Ok(())
    }

    fn stop_remote_participants_audio_level_observer(&self) -> Result<(), BackboneError> {
        self.record("stop_remote_observer")?;
        self.state.lock().remote_observer_running = false;
        Ok(())
    }

    fn send_app_message(
        &self,
        data: serde_json::Value,
        to: AppMessageRecipient,
    ) -> Result<(), BackboneError> {
        self.record("send_app_message")?;
        self.state.lock().sent.push((data, to));
        Ok(())
    }
}

/// Factory, die alle erzeugten [`FakeCall`]s aufbewahrt
#[derive(Default)]
pub(crate) struct FakeCallFactory {
    created: Mutex<Vec<Arc<FakeCall>>>,
}

impl FakeCallFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Das zuletzt erzeugte Call-Objekt
    pub fn last(&self) -> Arc<FakeCall> {
        self.created
            .lock()
            .last()
            .cloned()
            .expect("no call object created yet")
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn live_count(&self) -> usize {
        self.created
            .lock()
            .iter()
            .filter(|c| !c.is_destroyed())
            .count()
    }
}

impl CallFactory for FakeCallFactory {
    fn current_instance(&self) -> Option<Arc<dyn CallBackbone>> {
        self.created
            .lock()
            .iter()
            .rev()
            .find(|c| !c.is_destroyed())
            .map(|c| Arc::clone(c) as Arc<dyn CallBackbone>)
    }

    fn create_call_object(
        &self,
        options: CallOptions,
    ) -> Result<Arc<dyn CallBackbone>, BackboneError> {
        let call = Arc::new(FakeCall::new(options));
        self.created.lock().push(Arc::clone(&call));
        Ok(call)
    }
}
