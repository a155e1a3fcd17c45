//! Daily Transport
//!
//! Besitzt genau ein Call-Objekt, übersetzt dessen Events in die
//! RTVI-Callbacks und reicht Steuer-Operationen an das Backbone durch.

use crate::backbone::{
    AppMessageRecipient, BackboneError, BackboneEvent, CallBackbone, CallFactory, CallOptions,
    DeviceSelection, JoinOptions, MediaDeviceInfo,
};
use crate::config::TransportConfig;
use crate::rtvi::{
    BotTracks, LocalTracks, MessageHandler, NoopCallbacks, RtviClientOptions, RtviMessage,
    Tracks, Transport, TransportCallbacks, TransportError, TransportState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// ============================================================================
// AUTH BUNDLE
// ============================================================================

/// Zugangsdaten für einen Daily-Raum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTransportAuthBundle {
    pub room_url: String,
    #[serde(default)]
    pub token: String,
}

impl DailyTransportAuthBundle {
    pub fn new(room_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            room_url: room_url.into(),
            token: token.into(),
        }
    }
}

// ============================================================================
// SESSION STATE
// ============================================================================

/// Fortschritt des Ready-Handshakes innerhalb einer Session
#[derive(Debug, Default)]
pub(super) enum ReadyHandshake {
    #[default]
    Idle,
    /// Wartende `send_ready_message` Aufrufe
    Waiting(Vec<oneshot::Sender<()>>),
    /// `client-ready` wird gerade gesendet; neue Aufrufe reihen sich ein
    Sending(Vec<oneshot::Sender<()>>),
    Sent,
}

/// Welcher Eintrag der Geräteauswahl betroffen ist
#[derive(Debug, Clone, Copy)]
enum DeviceSlot {
    Camera,
    Mic,
    Speaker,
}

impl DeviceSlot {
    fn take_from(self, selection: DeviceSelection) -> Option<MediaDeviceInfo> {
        match self {
            DeviceSlot::Camera => selection.camera,
            DeviceSlot::Mic => selection.mic,
            DeviceSlot::Speaker => selection.speaker,
        }
    }

    fn slot(self, selection: &mut DeviceSelection) -> &mut Option<MediaDeviceInfo> {
        match self {
            DeviceSlot::Camera => &mut selection.camera,
            DeviceSlot::Mic => &mut selection.mic,
            DeviceSlot::Speaker => &mut selection.speaker,
        }
    }
}

/// Gemeinsamer Zustand von Transport und Event-Pump
///
/// Locks werden nie über einen await-Punkt oder einen Callback gehalten,
/// mit Ausnahme von `notify`.
pub(super) struct TransportInner {
    pub(super) call: RwLock<Option<Arc<dyn CallBackbone>>>,
    pub(super) callbacks: RwLock<Arc<dyn TransportCallbacks>>,
    pub(super) on_message: RwLock<Option<MessageHandler>>,
    pub(super) state: Mutex<TransportState>,
    /// Serialisiert Statuswechsel samt Callback
    notify: ReentrantMutex<()>,
    pub(super) bot_id: Mutex<Option<String>>,
    pub(super) selected: Mutex<DeviceSelection>,
    pub(super) expiry: Mutex<Option<DateTime<Utc>>>,
    pub(super) ready: Mutex<ReadyHandshake>,
}

impl TransportInner {
    fn new() -> Self {
        Self {
            call: RwLock::new(None),
            callbacks: RwLock::new(Arc::new(NoopCallbacks)),
            on_message: RwLock::new(None),
            state: Mutex::new(TransportState::Disconnected),
            notify: ReentrantMutex::new(()),
            bot_id: Mutex::new(None),
            selected: Mutex::new(DeviceSelection::default()),
            expiry: Mutex::new(None),
            ready: Mutex::new(ReadyHandshake::Idle),
        }
    }

    /// Das aktuelle Call-Objekt oder `NotInitialized`
    pub(super) fn call(&self) -> Result<Arc<dyn CallBackbone>, TransportError> {
        self.call.read().clone().ok_or(TransportError::NotInitialized)
    }

    pub(super) fn callbacks(&self) -> Arc<dyn TransportCallbacks> {
        Arc::clone(&self.callbacks.read())
    }

    pub(super) fn state(&self) -> TransportState {
        *self.state.lock()
    }

    /// Setzt den Status; nur echte Änderungen lösen den Callback aus
    ///
    /// Callbacks verschiedener Threads kommen in Reihenfolge der Wechsel an.
    pub(super) fn set_state(&self, new_state: TransportState) {
        let _notify = self.notify.lock();
        {
            let mut state = self.state.lock();
            if *state == new_state {
                return;
            }
            *state = new_state;
        }
        tracing::debug!("[RTVI Transport] State changed: {}", new_state);
        self.callbacks().on_transport_state_changed(new_state);
    }

    pub(super) fn send_message(&self, message: &RtviMessage) -> Result<(), TransportError> {
        let call = self.call()?;
        let data = serde_json::to_value(message)
            .map_err(|e| TransportError::MessageEncoding(e.to_string()))?;
        call.send_app_message(data, AppMessageRecipient::All)?;
        Ok(())
    }

    /// Verwirft allen Session-Zustand (neue Session oder Session verlassen)
    ///
    /// Wartende Ready-Handshakes erhalten `SessionEnded`.
    pub(super) fn reset_session(&self) {
        *self.bot_id.lock() = None;
        *self.ready.lock() = ReadyHandshake::Idle;
    }
}

// ============================================================================
// DAILY TRANSPORT
// ============================================================================

/// RTVI Transport auf Basis eines Daily Call-Objekts
pub struct DailyTransport {
    factory: Arc<dyn CallFactory>,
    config: TransportConfig,
    pub(super) inner: Arc<TransportInner>,
    event_pump: Mutex<Option<JoinHandle<()>>>,
}

impl DailyTransport {
    /// Erstellt einen neuen Transport mit Default-Konfiguration
    pub fn new(factory: Arc<dyn CallFactory>) -> Self {
        Self::with_config(factory, TransportConfig::default())
    }

    pub fn with_config(factory: Arc<dyn CallFactory>, config: TransportConfig) -> Self {
        Self {
            factory,
            config,
            inner: Arc::new(TransportInner::new()),
            event_pump: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Session-ID des Bots, falls einer verbunden ist
    pub fn bot_id(&self) -> Option<String> {
        self.inner.bot_id.lock().clone()
    }

    /// Übersetzt ein einzelnes Backbone-Event
    ///
    /// Die Event-Pump ruft dies für jedes abonnierte Event auf.
    pub fn handle_event(&self, event: BackboneEvent) {
        self.inner.handle_event(event);
    }

    /// Leitet die Events des Call-Objekts seriell an den Dispatcher
    fn spawn_event_pump(&self, call: &Arc<dyn CallBackbone>) {
        let mut event_rx = call.subscribe();
        let inner: Weak<TransportInner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            loop {
                match event_rx.recv().await {
                    Ok(event) => match inner.upgrade() {
                        Some(inner) => inner.handle_event(event),
                        None => break,
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("[RTVI Transport] Dropped {} backbone events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("[RTVI Transport] Event pump stopped");
        });

        if let Some(previous) = self.event_pump.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Zerstört das eigene und das global aktive Call-Objekt
    async fn destroy_existing_instances(&self) {
        let own = self.inner.call.write().take();
        let current = self.factory.current_instance();

        let mut stale: Vec<Arc<dyn CallBackbone>> = Vec::new();
        for call in own.into_iter().chain(current) {
            let already_listed = stale
                .iter()
                .any(|c| std::ptr::addr_eq(Arc::as_ptr(c), Arc::as_ptr(&call)));
            if !already_listed {
                stale.push(call);
            }
        }

        for call in stale {
            if let Err(e) = call.destroy().await {
                tracing::warn!("[RTVI Transport] Failed to destroy previous call object: {}", e);
            }
        }
    }

    /// Übernimmt die aktuelle Auswahl eines Geräts vom Backbone
    async fn refresh_selection(&self, call: &Arc<dyn CallBackbone>, slot: DeviceSlot) {
        match call.get_input_devices().await {
            Ok(devices) => {
                *slot.slot(&mut self.inner.selected.lock()) = slot.take_from(devices);
            }
            Err(e) => tracing::warn!(
                "[RTVI Transport] Failed to read input devices after {:?} change: {}",
                slot,
                e
            ),
        }
    }

    async fn select_device(&self, device_id: &str, slot: DeviceSlot) -> Result<(), TransportError> {
        let call = self.inner.call()?;
        let result = match slot {
            DeviceSlot::Camera => call.set_camera(device_id).await,
            DeviceSlot::Mic | DeviceSlot::Speaker => call.set_audio_device(device_id).await,
        };

        // Fehler des Backbones werden nur geloggt
        match result {
            Ok(()) => self.refresh_selection(&call, slot).await,
            Err(e) => tracing::warn!(
                "[RTVI Transport] Failed to select {:?} '{}': {}",
                slot,
                device_id,
                e
            ),
        }
        Ok(())
    }

    async fn devices_matching(
        &self,
        filter: fn(&MediaDeviceInfo) -> bool,
    ) -> Result<Vec<MediaDeviceInfo>, TransportError> {
        let call = self.inner.call()?;
        let devices = call.enumerate_devices().await?;
        Ok(devices.into_iter().filter(|d| filter(d)).collect())
    }
}

impl Drop for DailyTransport {
    fn drop(&mut self) {
        if let Some(pump) = self.event_pump.lock().take() {
            pump.abort();
        }
    }
}

impl std::fmt::Debug for DailyTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyTransport")
            .field("state", &self.inner.state())
            .field("bot_id", &self.bot_id())
            .field("initialized", &self.inner.call.read().is_some())
            .finish()
    }
}

/// Leitet die Call-Optionen aus den Client-Optionen ab
fn call_options(options: &RtviClientOptions, config: &TransportConfig) -> CallOptions {
    CallOptions {
        start_video_off: options.enable_cam != Some(true),
        start_audio_off: options.enable_mic == Some(false),
        allow_multiple_call_instances: config.allow_multiple_call_instances,
    }
}

#[async_trait]
impl Transport for DailyTransport {
    type AuthBundle = DailyTransportAuthBundle;

    async fn initialize(
        &self,
        options: RtviClientOptions,
        message_handler: MessageHandler,
    ) -> Result<(), TransportError> {
        *self.inner.callbacks.write() = options
            .callbacks
            .clone()
            .unwrap_or_else(|| Arc::new(NoopCallbacks));
        *self.inner.on_message.write() = Some(message_handler);

        if let Some(pump) = self.event_pump.lock().take() {
            pump.abort();
        }
        self.destroy_existing_instances().await;

        let call = self
            .factory
            .create_call_object(call_options(&options, &self.config))?;

        self.inner.reset_session();
        *self.inner.selected.lock() = DeviceSelection::default();
        *self.inner.expiry.lock() = None;

        self.spawn_event_pump(&call);
        *self.inner.call.write() = Some(call);

        self.inner.set_state(TransportState::Disconnected);

        tracing::debug!("[RTVI Transport] Initialized");
        Ok(())
    }

    fn state(&self) -> TransportState {
        self.inner.state()
    }

    async fn initialize_devices(&self) -> Result<(), TransportError> {
        let call = self.inner.call()?;

        self.inner.set_state(TransportState::Initializing);
        call.start_camera().await?;

        let devices = call.enumerate_devices().await?;
        let cams: Vec<MediaDeviceInfo> = devices.iter().filter(|d| d.is_camera()).cloned().collect();
        let mics: Vec<MediaDeviceInfo> = devices
            .iter()
            .filter(|d| d.is_microphone())
            .cloned()
            .collect();

        let callbacks = self.inner.callbacks();
        callbacks.on_available_cams_updated(&cams);
        callbacks.on_available_mics_updated(&mics);

        let input = call.get_input_devices().await?;
        {
            let mut selected = self.inner.selected.lock();
            selected.camera = input.camera.clone();
            selected.mic = input.mic.clone();
        }
        if let Some(cam) = &input.camera {
            callbacks.on_cam_updated(cam);
        }
        if let Some(mic) = &input.mic {
            callbacks.on_mic_updated(mic);
        }

        let interval = self.config.audio_level_interval;
        if !call.is_local_audio_level_observer_running() {
            call.start_local_audio_level_observer(interval).await?;
        }
        if !call.is_remote_participants_audio_level_observer_running() {
            call.start_remote_participants_audio_level_observer(interval)
                .await?;
        }

        self.inner.set_state(TransportState::Initialized);
        Ok(())
    }

    async fn connect(
        &self,
        auth_bundle: DailyTransportAuthBundle,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        let call = self.inner.call()?;

        if cancel.is_cancelled() {
            tracing::debug!("[RTVI Transport] Connect aborted before join");
            return Ok(());
        }

        self.inner.set_state(TransportState::Connecting);

        let joined = async {
            call.join(JoinOptions {
                url: auth_bundle.room_url,
                token: auth_bundle.token,
            })
            .await?;
            call.room().await
        }
        .await;

        let room = match joined {
            Ok(room) => room,
            Err(e) => {
                tracing::error!("[RTVI Transport] Failed to join room: {}", e);
                self.inner.set_state(TransportState::Error);
                return Err(TransportError::StartFailure(e.to_string()));
            }
        };

        if let Some(expiry) = room.as_ref().and_then(|r| r.expiry()) {
            *self.inner.expiry.lock() = Some(expiry);
        }

        if cancel.is_cancelled() {
            tracing::debug!("[RTVI Transport] Connect aborted after join");
            return Ok(());
        }

        self.inner.set_state(TransportState::Connected);
        self.inner.callbacks().on_connected();
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let call = self
            .inner
            .call
            .write()
            .take()
            .ok_or(TransportError::NotInitialized)?;

        // Alle Schritte werden versucht, auch wenn einer fehlschlägt
        let mut failures: Vec<BackboneError> = Vec::new();

        if let Err(e) = call.stop_local_audio_level_observer() {
            tracing::warn!("[RTVI Transport] Failed to stop local audio observer: {}", e);
            failures.push(e);
        }
        if let Err(e) = call.stop_remote_participants_audio_level_observer() {
            tracing::warn!("[RTVI Transport] Failed to stop remote audio observer: {}", e);
            failures.push(e);
        }
        if let Err(e) = call.leave().await {
            tracing::warn!("[RTVI Transport] Failed to leave session: {}", e);
            failures.push(e);
        }
        if let Err(e) = call.destroy().await {
            tracing::warn!("[RTVI Transport] Failed to destroy call object: {}", e);
            failures.push(e);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TransportError::Teardown(failures))
        }
    }

    async fn send_ready_message(&self) -> Result<(), TransportError> {
        self.inner.call()?;

        let ready_rx = {
            let mut ready = self.inner.ready.lock();
            let (tx, rx) = oneshot::channel();
            match &mut *ready {
                ReadyHandshake::Sent => return Ok(()),
                ReadyHandshake::Waiting(waiters) | ReadyHandshake::Sending(waiters) => {
                    waiters.push(tx)
                }
                idle @ ReadyHandshake::Idle => *idle = ReadyHandshake::Waiting(vec![tx]),
            }
            rx
        };

        ready_rx.await.map_err(|_| TransportError::SessionEnded)
    }

    fn send_message(&self, message: &RtviMessage) -> Result<(), TransportError> {
        self.inner.send_message(message)
    }

    async fn get_all_cams(&self) -> Result<Vec<MediaDeviceInfo>, TransportError> {
        self.devices_matching(MediaDeviceInfo::is_camera).await
    }

    async fn get_all_mics(&self) -> Result<Vec<MediaDeviceInfo>, TransportError> {
        self.devices_matching(MediaDeviceInfo::is_microphone).await
    }

    async fn get_all_speakers(&self) -> Result<Vec<MediaDeviceInfo>, TransportError> {
        self.devices_matching(MediaDeviceInfo::is_speaker).await
    }

    async fn update_cam(&self, cam_id: &str) -> Result<(), TransportError> {
        self.select_device(cam_id, DeviceSlot::Camera).await
    }

    async fn update_mic(&self, mic_id: &str) -> Result<(), TransportError> {
        self.select_device(mic_id, DeviceSlot::Mic).await
    }

    async fn update_speaker(&self, speaker_id: &str) -> Result<(), TransportError> {
        self.select_device(speaker_id, DeviceSlot::Speaker).await
    }

    fn selected_cam(&self) -> Option<MediaDeviceInfo> {
        self.inner.selected.lock().camera.clone()
    }

    fn selected_mic(&self) -> Option<MediaDeviceInfo> {
        self.inner.selected.lock().mic.clone()
    }

    fn selected_speaker(&self) -> Option<MediaDeviceInfo> {
        self.inner.selected.lock().speaker.clone()
    }

    fn enable_mic(&self, enable: bool) -> Result<(), TransportError> {
        self.inner.call()?.set_local_audio(enable)?;
        Ok(())
    }

    fn enable_cam(&self, enable: bool) -> Result<(), TransportError> {
        self.inner.call()?.set_local_video(enable)?;
        Ok(())
    }

    fn enable_screen_share(&self, enable: bool) -> Result<(), TransportError> {
        let call = self.inner.call()?;
        if enable {
            call.start_screen_share()?;
        } else {
            call.stop_screen_share()?;
        }
        Ok(())
    }

    fn is_mic_enabled(&self) -> bool {
        self.inner.call().map(|c| c.local_audio()).unwrap_or(false)
    }

    fn is_cam_enabled(&self) -> bool {
        self.inner.call().map(|c| c.local_video()).unwrap_or(false)
    }

    fn is_sharing_screen(&self) -> bool {
        self.inner
            .call()
            .map(|c| c.local_screen_audio() || c.local_screen_video())
            .unwrap_or(false)
    }

    fn tracks(&self) -> Tracks {
        let Ok(call) = self.inner.call() else {
            return Tracks::default();
        };
        let roster = call.participants();

        let mut tracks = Tracks::default();
        if let Some(local) = &roster.local {
            tracks.local = LocalTracks {
                audio: local.tracks.audio.clone(),
                screen_audio: local.tracks.screen_audio.clone(),
                screen_video: local.tracks.screen_video.clone(),
                video: local.tracks.video.clone(),
            };
        }

        if let Some(bot) = self.bot_id().as_deref().and_then(|id| roster.get(id)) {
            tracks.bot = Some(BotTracks {
                audio: bot.tracks.audio.clone(),
                video: bot.tracks.video.clone(),
            });
        }

        tracks
    }

    fn expiry(&self) -> Option<DateTime<Utc>> {
        *self.inner.expiry.lock()
    }
}
