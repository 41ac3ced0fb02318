//! Media Session
//!
//! Besitzt genau ein Capture-Handle und gleicht es mit der gewünschten
//! Auswahl (Kamera, Mikrofon, Kamera an/aus) ab. Identische Anfragen sind
//! ein No-op, jedes freigegebene Handle wird genau einmal gestoppt.

use super::monitor::MonitorHandle;
use super::{
    AudioConstraint, CaptureConstraints, CaptureStream, FacingMode, MediaDevices, MediaError,
    TrackInfo, VideoConstraint,
};
use crate::config::{AppConfig, FFT_SIZE};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

// ============================================================================
// CAPTURE KEY
// ============================================================================

/// Abgleich-Schlüssel. Bei ausgeschalteter Kamera spielt die Kamera-ID keine Rolle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureKey {
    pub video_id: Option<String>,
    pub audio_id: Option<String>,
    pub camera_enabled: bool,
}

impl CaptureKey {
    pub fn new(video_id: Option<String>, audio_id: Option<String>, camera_enabled: bool) -> Self {
        Self {
            video_id: if camera_enabled { video_id } else { None },
            audio_id,
            camera_enabled,
        }
    }

    /// Video nur bei eingeschalteter Kamera, Audio immer
    pub fn constraints(&self, facing_mode: FacingMode) -> CaptureConstraints {
        CaptureConstraints {
            video: self.camera_enabled.then(|| VideoConstraint {
                device_id: self.video_id.clone(),
                facing_mode,
            }),
            audio: AudioConstraint {
                device_id: self.audio_id.clone(),
            },
        }
    }
}

// ============================================================================
// LIVE CAPTURE
// ============================================================================

/// Ein Capture-Handle samt Monitor. Drop gibt beides frei.
struct LiveCapture {
    key: CaptureKey,
    stream: Box<dyn CaptureStream>,
    monitor: Option<MonitorHandle>,
}

impl Drop for LiveCapture {
    fn drop(&mut self) {
        if let Some(mut monitor) = self.monitor.take() {
            monitor.stop();
        }
        self.stream.stop_all_tracks();
        tracing::info!("Released capture {}", self.stream.id());
    }
}

// ============================================================================
// MEDIA SESSION
// ============================================================================

pub struct MediaSession {
    devices: Arc<dyn MediaDevices>,
    current: Option<LiveCapture>,
    muted: bool,
    facing_mode: FacingMode,
    sample_interval: Duration,
    speaking_threshold: u8,
    speaking_tx: Arc<watch::Sender<bool>>,
}

impl MediaSession {
    pub fn new(devices: Arc<dyn MediaDevices>, config: &AppConfig) -> Self {
        let (speaking_tx, _) = watch::channel(false);

        Self {
            devices,
            current: None,
            muted: false,
            facing_mode: FacingMode::default(),
            sample_interval: config.sample_interval,
            speaking_threshold: config.speaking_threshold,
            speaking_tx: Arc::new(speaking_tx),
        }
    }

    /// Receiver für das "spricht gerade"-Signal
    pub fn subscribe_speaking(&self) -> watch::Receiver<bool> {
        self.speaking_tx.subscribe()
    }

    pub fn is_speaking(&self) -> bool {
        *self.speaking_tx.borrow()
    }

    pub fn key(&self) -> Option<&CaptureKey> {
        self.current.as_ref().map(|live| &live.key)
    }

    pub fn capture_id(&self) -> Option<&str> {
        self.current.as_ref().map(|live| live.stream.id())
    }

    pub fn tracks(&self) -> Vec<TrackInfo> {
        self.current
            .as_ref()
            .map(|live| live.stream.tracks())
            .unwrap_or_default()
    }

    pub fn is_monitoring(&self) -> bool {
        self.current
            .as_ref()
            .and_then(|live| live.monitor.as_ref())
            .map(|m| m.is_running())
            .unwrap_or(false)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Bringt das Capture-Handle auf den Stand von `key`.
    ///
    /// Gibt `Ok(false)` zurück wenn nichts zu tun war. Bei einem Fehler
    /// bleibt das bisherige Handle unverändert bestehen.
    pub async fn reconcile(&mut self, key: CaptureKey) -> Result<bool, MediaError> {
        if let Some(live) = self.current.as_mut() {
            if live.key == key {
                return Ok(false);
            }

            // Kamera aus: Video-Tracks stoppen, Audio läuft weiter
            if live.key.camera_enabled && !key.camera_enabled && live.key.audio_id == key.audio_id
            {
                live.stream.stop_video_tracks();
                tracing::info!("Stopped video tracks of capture {}", live.stream.id());
                live.key = key;
                return Ok(true);
            }
        }

        let constraints = key.constraints(self.facing_mode);
        tracing::debug!("Requesting capture: {:?}", constraints);

        let mut stream = self
            .devices
            .get_user_media(constraints)
            .await
            .map_err(|e| {
                tracing::error!("Error accessing media devices: {}", e);
                e
            })?;

        if self.muted {
            stream.set_audio_enabled(false);
        }

        let monitor = match stream.create_analyser(FFT_SIZE) {
            Ok(analyser) => Some(MonitorHandle::start(
                analyser,
                self.sample_interval,
                self.speaking_threshold,
                Arc::clone(&self.speaking_tx),
            )),
            Err(e) => {
                tracing::warn!("No audio analyser for capture {}: {}", stream.id(), e);
                None
            }
        };

        tracing::info!("Acquired capture {} for {:?}", stream.id(), key);

        let previous = self.current.replace(LiveCapture {
            key,
            stream,
            monitor,
        });
        if previous.is_some() {
            drop(previous);
            self.speaking_tx.send_replace(false);
        }

        Ok(true)
    }

    /// Setzt den Mute-Status, auch für künftige Handles.
    /// Gibt `true` zurück wenn ein Handle betroffen war.
    pub fn set_muted(&mut self, muted: bool) -> bool {
        self.muted = muted;
        match self.current.as_mut() {
            Some(live) => {
                live.stream.set_audio_enabled(!muted);
                tracing::debug!("Audio muted: {}", muted);
                true
            }
            None => false,
        }
    }

    /// Gibt Handle und Monitor frei
    pub fn teardown(&mut self) {
        if self.current.take().is_some() {
            self.speaking_tx.send_replace(false);
        }
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ============================================================================
// TESTS
// ============================================================================
