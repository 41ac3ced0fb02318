//! Home Screen
//!
//! Verbindet Geräte-Inventar, Media Session, Pegel-Monitor und die
//! Bedienelemente zu einer Ansicht. Änderungen werden als [`HomeEvent`]
//! veröffentlicht, das Frontend holt sich danach die aktuelle [`HomeView`].

pub mod peer;
pub mod state;

pub use peer::{PeerState, SimulatedPeer, REMOTE_STREAM_PLACEHOLDER};
pub use state::{ActiveSession, HomeError, HomeState};

use crate::config::AppConfig;
use crate::media::{CaptureKey, DeviceInventory, DeviceKind, MediaDevices, MediaSession};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Hinweis bei fehlgeschlagenem Kamera-/Mikrofonzugriff
pub const CAPTURE_NOTICE: &str =
    "Unable to access your camera or microphone. Please check your permissions.";

pub const REMOTE_LABEL: &str = "Remote User";
pub const SEARCHING_LABEL: &str = "Searching...";

// ============================================================================
// EVENTS
// ============================================================================

/// Events die vom Home Screen ausgelöst werden
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeEvent {
    /// Zustand hat sich geändert, View neu laden
    StateChanged,
    Speaking(bool),
    /// Kamera für die lokale Vorschau (`None` = keine Vorschau)
    Preview { video_device_id: Option<String> },
    /// Blockierender Hinweis für den Benutzer
    Notice(String),
    PeerConnected { remote: String },
    PeerDisconnected,
}

// ============================================================================
// VIEW MODEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    /// "nameEntry" oder "active"
    pub screen: &'static str,
    pub name_draft: String,
    pub local_label: Option<String>,
    pub camera_on: bool,
    pub muted: bool,
    pub speaking: bool,
    pub settings_open: bool,
    pub preview_device_id: Option<String>,
    pub peer: PeerState,
    pub remote_label: Option<&'static str>,
    pub remote_placeholder: Option<&'static str>,
    pub video_devices: Vec<DeviceOption>,
    pub audio_devices: Vec<DeviceOption>,
    pub selected_video: Option<String>,
    pub selected_audio: Option<String>,
}

// ============================================================================
// HOME SCREEN
// ============================================================================

pub struct HomeScreen {
    devices: Arc<dyn MediaDevices>,
    state: HomeState,
    inventory: DeviceInventory,
    session: MediaSession,
    peer: SimulatedPeer,
    event_tx: broadcast::Sender<HomeEvent>,
    speaking_forwarder: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl HomeScreen {
    pub fn new(devices: Arc<dyn MediaDevices>, config: &AppConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            session: MediaSession::new(Arc::clone(&devices), config),
            peer: SimulatedPeer::new(config.connect_delay, event_tx.clone()),
            devices,
            state: HomeState::default(),
            inventory: DeviceInventory::default(),
            event_tx,
            speaking_forwarder: None,
            torn_down: false,
        }
    }

    /// Gibt einen Event-Receiver zurück
    pub fn subscribe(&self) -> broadcast::Receiver<HomeEvent> {
        self.event_tx.subscribe()
    }

    pub fn state(&self) -> &HomeState {
        &self.state
    }

    pub fn inventory(&self) -> &DeviceInventory {
        &self.inventory
    }

    pub fn session(&self) -> &MediaSession {
        &self.session
    }

    /// Lädt die Geräte und fordert das erste Capture-Handle an
    pub async fn mount(&mut self) {
        self.torn_down = false;
        self.inventory = DeviceInventory::load(self.devices.as_ref()).await;

        if self.speaking_forwarder.is_none() {
            let mut speaking_rx = self.session.subscribe_speaking();
            let event_tx = self.event_tx.clone();
            self.speaking_forwarder = Some(tokio::spawn(async move {
                while speaking_rx.changed().await.is_ok() {
                    let speaking = *speaking_rx.borrow_and_update();
                    let _ = event_tx.send(HomeEvent::Speaking(speaking));
                }
            }));
        }

        // Fehler wurde bereits als Hinweis veröffentlicht
        let _ = self.apply_media().await;
        self.emit(HomeEvent::StateChanged);
    }

    /// Gibt alle Ressourcen frei und bricht ausstehende Timer ab.
    /// Gibt `false` zurück, wenn bereits abgebaut.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;

        self.peer.cancel();
        self.session.teardown();
        if let Some(task) = self.speaking_forwarder.take() {
            task.abort();
        }
        tracing::info!("Home screen torn down");
        true
    }

    // ========================================================================
    // NAME ENTRY
    // ========================================================================

    pub fn set_name_draft(&mut self, draft: &str) -> Result<(), HomeError> {
        self.state.set_draft(draft)
    }

    pub fn submit_name(&mut self, name: &str) -> Result<(), HomeError> {
        match self.state.submit_name(name) {
            Ok(active) => {
                tracing::info!("Name entered: {}", active.name);
                self.emit(HomeEvent::StateChanged);
                Ok(())
            }
            Err(HomeError::EmptyName) => {
                tracing::warn!("Rejected empty name");
                self.emit(HomeEvent::Notice(HomeError::EmptyName.to_string()));
                Err(HomeError::EmptyName)
            }
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // SESSION CONTROLS
    // ========================================================================

    /// Schaltet das Mikrofon stumm bzw. wieder an, gibt den neuen Status zurück
    pub fn toggle_mute(&mut self) -> Result<bool, HomeError> {
        let active = self.state.active_mut()?;
        active.muted = !active.muted;
        let muted = active.muted;

        self.session.set_muted(muted);
        self.emit(HomeEvent::StateChanged);
        Ok(muted)
    }

    /// Schaltet die Kamera um. Schlägt das Einschalten fehl, bleibt sie aus.
    pub async fn toggle_camera(&mut self) -> Result<bool, HomeError> {
        let active = self.state.active_mut()?;
        active.camera_on = !active.camera_on;
        let camera_on = active.camera_on;
        tracing::debug!("Camera on: {}", camera_on);

        if let Err(e) = self.apply_media().await {
            if let Ok(active) = self.state.active_mut() {
                active.camera_on = !camera_on;
            }
            return Err(e);
        }

        self.emit(HomeEvent::StateChanged);
        Ok(camera_on)
    }

    pub fn open_settings(&mut self) -> Result<(), HomeError> {
        self.state.active_mut()?.settings_open = true;
        self.emit(HomeEvent::StateChanged);
        Ok(())
    }

    pub fn close_settings(&mut self) -> Result<(), HomeError> {
        self.state.active_mut()?.settings_open = false;
        self.emit(HomeEvent::StateChanged);
        Ok(())
    }

    pub fn rename(&mut self, name: &str) -> Result<(), HomeError> {
        self.state.rename(name)?;
        self.emit(HomeEvent::StateChanged);
        Ok(())
    }

    pub async fn select_video_device(&mut self, id: &str) -> Result<(), HomeError> {
        self.select_device(DeviceKind::Video, id).await
    }

    pub async fn select_audio_device(&mut self, id: &str) -> Result<(), HomeError> {
        self.select_device(DeviceKind::Audio, id).await
    }

    pub fn connect(&mut self) -> Result<(), HomeError> {
        self.state.active_mut()?;
        self.peer.connect();
        self.emit(HomeEvent::StateChanged);
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<(), HomeError> {
        self.state.active_mut()?;
        self.peer.disconnect();
        self.emit(HomeEvent::StateChanged);
        Ok(())
    }

    // ========================================================================
    // VIEW
    // ========================================================================

    pub fn view(&self) -> HomeView {
        let active = self.state.active();
        let peer = self.peer.state();

        let options = |kind: DeviceKind| {
            let list = match kind {
                DeviceKind::Video => &self.inventory.video,
                DeviceKind::Audio => &self.inventory.audio,
            };
            list.iter()
                .map(|d| DeviceOption {
                    id: d.id.clone(),
                    label: d.display_label(),
                })
                .collect()
        };

        HomeView {
            screen: if active.is_some() { "active" } else { "nameEntry" },
            name_draft: match &self.state {
                HomeState::NameEntry { draft } => draft.clone(),
                HomeState::Active(_) => String::new(),
            },
            local_label: active.map(|a| a.name.clone()),
            camera_on: active.map(|a| a.camera_on).unwrap_or(false),
            muted: active.map(|a| a.muted).unwrap_or(false),
            speaking: self.session.is_speaking(),
            settings_open: active.map(|a| a.settings_open).unwrap_or(false),
            preview_device_id: self.preview_device_id(),
            remote_label: matches!(peer, PeerState::Connected { .. }).then_some(REMOTE_LABEL),
            remote_placeholder: (!matches!(peer, PeerState::Connected { .. }))
                .then_some(SEARCHING_LABEL),
            peer,
            video_devices: options(DeviceKind::Video),
            audio_devices: options(DeviceKind::Audio),
            selected_video: self.inventory.selected_video.clone(),
            selected_audio: self.inventory.selected_audio.clone(),
        }
    }

    // ========================================================================
    // PRIVATE METHODS
    // ========================================================================

    fn capture_key(&self) -> CaptureKey {
        CaptureKey::new(
            self.inventory.selected_video.clone(),
            self.inventory.selected_audio.clone(),
            self.state.camera_enabled(),
        )
    }

    /// Kamera der lebenden Video-Spur, falls vorhanden
    fn preview_device_id(&self) -> Option<String> {
        self.session
            .tracks()
            .into_iter()
            .find(|t| t.kind == DeviceKind::Video && t.live)
            .and_then(|t| t.device_id)
    }

    /// Gleicht das Capture-Handle mit dem aktuellen Zustand ab
    async fn apply_media(&mut self) -> Result<bool, HomeError> {
        match self.session.reconcile(self.capture_key()).await {
            Ok(changed) => {
                if changed {
                    self.emit(HomeEvent::Preview {
                        video_device_id: self.preview_device_id(),
                    });
                }
                Ok(changed)
            }
            Err(e) => {
                self.emit(HomeEvent::Notice(CAPTURE_NOTICE.to_string()));
                Err(e.into())
            }
        }
    }

    async fn select_device(&mut self, kind: DeviceKind, id: &str) -> Result<(), HomeError> {
        let previous = match kind {
            DeviceKind::Video => self.inventory.selected_video.clone(),
            DeviceKind::Audio => self.inventory.selected_audio.clone(),
        };

        if !self.inventory.select(kind, id) {
            tracing::warn!("Unknown {} device selected: {}", kind, id);
            return Err(HomeError::UnknownDevice {
                kind,
                id: id.to_string(),
            });
        }

        if let Err(e) = self.apply_media().await {
            match kind {
                DeviceKind::Video => self.inventory.selected_video = previous,
                DeviceKind::Audio => self.inventory.selected_audio = previous,
            }
            return Err(e);
        }

        self.emit(HomeEvent::StateChanged);
        Ok(())
    }

    fn emit(&self, event: HomeEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl Drop for HomeScreen {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::FakeMediaDevices;
    use crate::media::MediaError;
    use std::time::Duration;

    async fn mounted(fake: &Arc<FakeMediaDevices>) -> HomeScreen {
        let mut home = HomeScreen::new(
            Arc::clone(fake) as Arc<dyn MediaDevices>,
            &AppConfig::default(),
        );
        home.mount().await;
        home
    }

    fn drain(rx: &mut broadcast::Receiver<HomeEvent>) -> Vec<HomeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_acquires_audio_only_capture() {
        let fake = Arc::new(FakeMediaDevices::new());
        let home = mounted(&fake).await;

        assert_eq!(fake.acquisitions(), 1);
        let view = home.view();
        assert_eq!(view.screen, "nameEntry");
        assert!(!view.camera_on);
        assert_eq!(view.preview_device_id, None);
        assert_eq!(view.selected_audio.as_deref(), Some("mic-1"));
        assert_eq!(view.video_devices[1].label, "Camera cam-2");
        assert_eq!(view.remote_placeholder, Some(SEARCHING_LABEL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_name_entry() {
        let fake = Arc::new(FakeMediaDevices::new());
        let mut home = mounted(&fake).await;
        let mut rx = home.subscribe();

        assert_eq!(home.submit_name("  "), Err(HomeError::EmptyName));
        assert_eq!(home.view().screen, "nameEntry");
        assert!(drain(&mut rx).contains(&HomeEvent::Notice("Please enter your name.".into())));

        assert_eq!(home.toggle_mute(), Err(HomeError::NotActive));
        assert_eq!(home.connect(), Err(HomeError::NotActive));

        home.submit_name("Alice").unwrap();
        let view = home.view();
        assert_eq!(view.screen, "active");
        assert_eq!(view.local_label.as_deref(), Some("Alice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_toggle() {
        let fake = Arc::new(FakeMediaDevices::new());
        let mut home = mounted(&fake).await;
        home.submit_name("Alice").unwrap();
        let mut rx = home.subscribe();

        assert!(home.toggle_camera().await.unwrap());
        assert_eq!(fake.acquisitions(), 2);
        assert_eq!(home.view().preview_device_id.as_deref(), Some("cam-1"));
        assert!(drain(&mut rx).contains(&HomeEvent::Preview {
            video_device_id: Some("cam-1".into())
        }));

        let handle = fake.handle(1);
        assert!(!home.toggle_camera().await.unwrap());
        {
            let state = handle.lock();
            assert_eq!(state.live_tracks(DeviceKind::Video), 0);
            assert_eq!(state.live_tracks(DeviceKind::Audio), 1);
        }
        assert_eq!(fake.acquisitions(), 2);
        assert_eq!(home.view().preview_device_id, None);
        assert!(drain(&mut rx).contains(&HomeEvent::Preview {
            video_device_id: None
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_failure_reverts_and_notifies() {
        let fake = Arc::new(FakeMediaDevices::new());
        let mut home = mounted(&fake).await;
        home.submit_name("Alice").unwrap();
        let mut rx = home.subscribe();

        fake.fail_capture(Some(MediaError::PermissionDenied));
        let err = home.toggle_camera().await.unwrap_err();
        assert_eq!(err, HomeError::Media(MediaError::PermissionDenied));

        assert!(!home.view().camera_on);
        assert_eq!(home.session().capture_id(), Some("capture-1"));
        assert!(drain(&mut rx).contains(&HomeEvent::Notice(CAPTURE_NOTICE.into())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_microphone_change_releases_previous_once() {
        let fake = Arc::new(FakeMediaDevices::new());
        let mut home = mounted(&fake).await;

        home.select_audio_device("mic-2").await.unwrap();
        assert_eq!(fake.acquisitions(), 2);
        assert_eq!(fake.handle(0).lock().stop_all_calls, 1);
        assert_eq!(fake.handle(0).lock().analysers_closed, 1);
        assert_eq!(home.view().selected_audio.as_deref(), Some("mic-2"));

        // Gleiche Auswahl erneut: keine neue Anfrage
        home.select_audio_device("mic-2").await.unwrap();
        assert_eq!(fake.acquisitions(), 2);

        let err = home.select_audio_device("nope").await.unwrap_err();
        assert!(matches!(err, HomeError::UnknownDevice { .. }));
        assert_eq!(fake.acquisitions(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_device_switch_restores_selection() {
        let fake = Arc::new(FakeMediaDevices::new());
        let mut home = mounted(&fake).await;

        fake.fail_capture(Some(MediaError::Backend("busy".into())));
        assert!(home.select_audio_device("mic-2").await.is_err());
        assert_eq!(home.view().selected_audio.as_deref(), Some("mic-1"));
        assert_eq!(fake.handle(0).lock().stop_all_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_then_disconnect_never_shows_remote() {
        let fake = Arc::new(FakeMediaDevices::new());
        let mut home = mounted(&fake).await;
        home.submit_name("Alice").unwrap();
        let mut rx = home.subscribe();

        home.connect().unwrap();
        home.disconnect().unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;

        let view = home.view();
        assert_eq!(view.peer, PeerState::Idle);
        assert_eq!(view.remote_label, None);
        assert!(!drain(&mut rx)
            .iter()
            .any(|e| matches!(e, HomeEvent::PeerConnected { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_shows_remote_user() {
        let fake = Arc::new(FakeMediaDevices::new());
        let mut home = mounted(&fake).await;
        home.submit_name("Alice").unwrap();

        home.connect().unwrap();
        assert_eq!(home.view().peer, PeerState::Searching);
        tokio::time::sleep(Duration::from_millis(2100)).await;

        let view = home.view();
        assert_eq!(view.remote_label, Some(REMOTE_LABEL));
        assert_eq!(view.remote_placeholder, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_releases_everything() {
        let fake = Arc::new(FakeMediaDevices::new());
        let mut home = mounted(&fake).await;
        home.submit_name("Alice").unwrap();
        home.connect().unwrap();
        let mut rx = home.subscribe();

        assert!(home.teardown());
        assert!(fake.handle(0).lock().all_stopped());
        assert_eq!(fake.handle(0).lock().analysers_closed, 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!home.peer.is_connected());
        assert!(drain(&mut rx).is_empty());

        assert!(!home.teardown());
        drop(home);
        assert_eq!(fake.handle(0).lock().stop_all_calls, 1);
        assert_eq!(fake.handle(0).lock().analysers_closed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speaking_is_forwarded() {
        let fake = Arc::new(FakeMediaDevices::new());
        fake.set_level(150);
        let home = mounted(&fake).await;
        let mut rx = home.subscribe();

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, HomeEvent::Speaking(true));
        assert!(home.view().speaking);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_and_mute() {
        let fake = Arc::new(FakeMediaDevices::new());
        let mut home = mounted(&fake).await;
        home.submit_name("Alice").unwrap();

        home.open_settings().unwrap();
        assert!(home.view().settings_open);
        home.rename("Bob").unwrap();
        home.close_settings().unwrap();

        assert!(home.toggle_mute().unwrap());
        let view = home.view();
        assert!(view.muted);
        assert!(!view.settings_open);
        assert_eq!(view.local_label.as_deref(), Some("Bob"));
        assert!(home
            .session()
            .tracks()
            .iter()
            .all(|t| t.kind != DeviceKind::Audio || !t.enabled));
    }

    #[tokio::test]
    async fn test_enumeration_failure_still_mounts() {
        let fake = Arc::new(FakeMediaDevices::failing_enumeration());
        let home = mounted(&fake).await;

        let view = home.view();
        assert!(view.video_devices.is_empty());
        assert!(view.audio_devices.is_empty());
        assert_eq!(fake.enumerate_calls(), 1);
    }
}
