//! Media Modul - Geräte, Capture und Pegel-Analyse
//!
//! Dieses Modul verwaltet:
//! - Geräte-Inventar (Kameras und Mikrofone)
//! - Die Media Session (genau ein Capture-Handle zur Zeit)
//! - Den Audio-Pegel-Monitor ("spricht gerade")
//!
//! Die Plattform wird über die Traits [`MediaDevices`], [`CaptureStream`]
//! und [`FrequencyAnalyser`] angebunden.

#[cfg(feature = "audio")]
pub mod desktop;
mod inventory;
mod monitor;
mod session;
pub mod spectrum;
#[cfg(test)]
pub(crate) mod testing;

pub use inventory::DeviceInventory;
pub use monitor::{is_speaking, mean_level, MonitorHandle};
pub use session::{CaptureKey, MediaSession};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("Permission to access media devices was denied")]
    PermissionDenied,

    #[error("No {0} device found")]
    NotFound(DeviceKind),

    #[error("Failed to enumerate devices: {0}")]
    EnumerationFailed(String),

    #[error("Unsupported capture configuration: {0}")]
    UnsupportedConfig(String),

    #[error("Media backend error: {0}")]
    Backend(String),
}

// ============================================================================
// DEVICES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Video,
    Audio,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Video => write!(f, "videoinput"),
            DeviceKind::Audio => write!(f, "audioinput"),
        }
    }
}

/// Ein Eingabegerät, wie es die Plattform meldet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub label: String,
    pub kind: DeviceKind,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }

    /// Anzeigename, mit Fallback wenn die Plattform kein Label liefert
    pub fn display_label(&self) -> String {
        if !self.label.trim().is_empty() {
            return self.label.clone();
        }
        match self.kind {
            DeviceKind::Video => format!("Camera {}", self.id),
            DeviceKind::Audio => format!("Microphone {}", self.id),
        }
    }
}

// ============================================================================
// CAPTURE CONSTRAINTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraint {
    /// `None` = beliebige Kamera
    pub device_id: Option<String>,
    pub facing_mode: FacingMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConstraint {
    /// `None` = Standard-Mikrofon
    pub device_id: Option<String>,
}

/// Auswahl für eine Capture-Anfrage. Audio wird immer angefragt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConstraints {
    pub video: Option<VideoConstraint>,
    pub audio: AudioConstraint,
}

// ============================================================================
// TRACKS
// ============================================================================

/// Schnappschuss eines einzelnen Tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub kind: DeviceKind,
    pub device_id: Option<String>,
    /// `false` sobald der Track gestoppt wurde
    pub live: bool,
    pub enabled: bool,
}

// ============================================================================
// PLATFORM CAPABILITIES
// ============================================================================

/// Zugriff auf die Eingabegeräte der Plattform
pub trait MediaDevices: Send + Sync {
    /// Listet alle Eingabegeräte
    fn enumerate_devices(&self) -> BoxFuture<'_, Result<Vec<DeviceDescriptor>, MediaError>>;

    /// Fordert ein neues Capture-Handle an
    fn get_user_media(
        &self,
        constraints: CaptureConstraints,
    ) -> BoxFuture<'_, Result<Box<dyn CaptureStream>, MediaError>>;
}

/// Ein lebendes Audio/Video Capture-Handle
pub trait CaptureStream: Send {
    fn id(&self) -> &str;

    fn tracks(&self) -> Vec<TrackInfo>;

    /// Aktiviert oder deaktiviert die Audio-Tracks (Mute)
    fn set_audio_enabled(&mut self, enabled: bool);

    /// Stoppt nur die Video-Tracks
    fn stop_video_tracks(&mut self);

    /// Stoppt alle Tracks
    fn stop_all_tracks(&mut self);

    /// Baut einen Frequenz-Analyser auf dem Audio-Signal dieses Handles
    fn create_analyser(&self, fft_size: usize) -> Result<Box<dyn FrequencyAnalyser>, MediaError>;
}

/// Liefert Frequenz-Energie pro Bin (0-255).
///
/// Das Droppen des Analysers schließt den zugehörigen Audio-Graphen.
pub trait FrequencyAnalyser: Send {
    fn frequency_bin_count(&self) -> usize;

    /// Füllt `out` mit den aktuellen Bin-Werten
    fn get_byte_frequency_data(&mut self, out: &mut [u8]);
}
