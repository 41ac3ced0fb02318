//! Geräte-Inventar
//!
//! Fragt die Plattform einmal nach allen Eingabegeräten und wählt jeweils
//! das erste Gerät als Standard aus.

use super::{DeviceDescriptor, DeviceKind, MediaDevices};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInventory {
    pub video: Vec<DeviceDescriptor>,
    pub audio: Vec<DeviceDescriptor>,
    pub selected_video: Option<String>,
    pub selected_audio: Option<String>,
}

impl DeviceInventory {
    /// Baut das Inventar aus einer Geräteliste
    pub fn from_devices(devices: Vec<DeviceDescriptor>) -> Self {
        let (video, audio): (Vec<_>, Vec<_>) = devices
            .into_iter()
            .partition(|d| d.kind == DeviceKind::Video);

        let selected_video = video.first().map(|d| d.id.clone());
        let selected_audio = audio.first().map(|d| d.id.clone());

        Self {
            video,
            audio,
            selected_video,
            selected_audio,
        }
    }

    /// Lädt das Inventar. Fehler werden geloggt und ergeben ein leeres Inventar.
    pub async fn load(devices: &dyn MediaDevices) -> Self {
        match devices.enumerate_devices().await {
            Ok(list) => {
                let inventory = Self::from_devices(list);
                tracing::info!(
                    "Found {} camera(s), {} microphone(s)",
                    inventory.video.len(),
                    inventory.audio.len()
                );
                inventory
            }
            Err(e) => {
                tracing::error!("Error enumerating devices: {}", e);
                Self::default()
            }
        }
    }

    pub fn contains(&self, kind: DeviceKind, id: &str) -> bool {
        let list = match kind {
            DeviceKind::Video => &self.video,
            DeviceKind::Audio => &self.audio,
        };
        list.iter().any(|d| d.id == id)
    }

    /// Wählt ein Gerät aus, gibt `false` zurück wenn die ID unbekannt ist
    pub fn select(&mut self, kind: DeviceKind, id: &str) -> bool {
        if !self.contains(kind, id) {
            return false;
        }
        let slot = match kind {
            DeviceKind::Video => &mut self.selected_video,
            DeviceKind::Audio => &mut self.selected_audio,
        };
        *slot = Some(id.to_string());
        true
    }
}
