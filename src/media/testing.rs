//! Test-Doubles für die Plattform-Traits
//!
//! Zeichnet jede Anfrage, jeden Track-Status sowie Analyser-Polls und
//! -Schließungen auf, damit Tests die Freigabe-Disziplin prüfen können.

use super::{
    CaptureConstraints, CaptureStream, DeviceDescriptor, DeviceKind, FrequencyAnalyser,
    MediaDevices, MediaError, TrackInfo,
};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Zustand eines vom Fake ausgegebenen Handles
#[derive(Debug, Default)]
pub struct FakeHandleState {
    pub id: String,
    pub constraints: Option<CaptureConstraints>,
    pub tracks: Vec<TrackInfo>,
    pub stop_all_calls: usize,
    pub analysers_created: usize,
    pub analysers_closed: usize,
    pub polls: usize,
}

impl FakeHandleState {
    pub fn live_tracks(&self, kind: DeviceKind) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.kind == kind && t.live)
            .count()
    }

    pub fn all_stopped(&self) -> bool {
        self.tracks.iter().all(|t| !t.live)
    }
}

pub struct FakeMediaDevices {
    devices: Mutex<Result<Vec<DeviceDescriptor>, MediaError>>,
    capture_failure: Mutex<Option<MediaError>>,
    level: Arc<AtomicU8>,
    enumerate_calls: Mutex<usize>,
    handles: Mutex<Vec<Arc<Mutex<FakeHandleState>>>>,
}

impl FakeMediaDevices {
    /// Zwei Kameras, zwei Mikrofone
    pub fn new() -> Self {
        Self::with_devices(vec![
            DeviceDescriptor::new("cam-1", "Front Camera", DeviceKind::Video),
            DeviceDescriptor::new("mic-1", "Built-in Microphone", DeviceKind::Audio),
            DeviceDescriptor::new("cam-2", "", DeviceKind::Video),
            DeviceDescriptor::new("mic-2", "USB Headset", DeviceKind::Audio),
        ])
    }

    pub fn with_devices(devices: Vec<DeviceDescriptor>) -> Self {
        Self {
            devices: Mutex::new(Ok(devices)),
            capture_failure: Mutex::new(None),
            level: Arc::new(AtomicU8::new(0)),
            enumerate_calls: Mutex::new(0),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_enumeration() -> Self {
        let fake = Self::new();
        *fake.devices.lock() = Err(MediaError::PermissionDenied);
        fake
    }

    /// Alle folgenden Capture-Anfragen schlagen mit `error` fehl
    pub fn fail_capture(&self, error: Option<MediaError>) {
        *self.capture_failure.lock() = error;
    }

    /// Wert, den jeder Analyser für alle Bins liefert
    pub fn set_level(&self, level: u8) {
        self.level.store(level, Ordering::SeqCst);
    }

    pub fn enumerate_calls(&self) -> usize {
        *self.enumerate_calls.lock()
    }

    pub fn acquisitions(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn handle(&self, index: usize) -> Arc<Mutex<FakeHandleState>> {
        Arc::clone(&self.handles.lock()[index])
    }

    pub fn last_handle(&self) -> Arc<Mutex<FakeHandleState>> {
        let handles = self.handles.lock();
        Arc::clone(handles.last().expect("no handle acquired yet"))
    }

    fn first_of(&self, kind: DeviceKind) -> Option<String> {
        match &*self.devices.lock() {
            Ok(devices) => devices.iter().find(|d| d.kind == kind).map(|d| d.id.clone()),
            Err(_) => None,
        }
    }

    fn acquire(&self, constraints: CaptureConstraints) -> Result<FakeCapture, MediaError> {
        if let Some(err) = self.capture_failure.lock().clone() {
            return Err(err);
        }

        let mut tracks = Vec::new();

        if let Some(video) = &constraints.video {
            let device_id = video
                .device_id
                .clone()
                .or_else(|| self.first_of(DeviceKind::Video))
                .ok_or(MediaError::NotFound(DeviceKind::Video))?;
            tracks.push(TrackInfo {
                kind: DeviceKind::Video,
                device_id: Some(device_id),
                live: true,
                enabled: true,
            });
        }

        tracks.push(TrackInfo {
            kind: DeviceKind::Audio,
            device_id: constraints
                .audio
                .device_id
                .clone()
                .or_else(|| self.first_of(DeviceKind::Audio)),
            live: true,
            enabled: true,
        });

        let mut handles = self.handles.lock();
        let id = format!("capture-{}", handles.len() + 1);
        let state = Arc::new(Mutex::new(FakeHandleState {
            id: id.clone(),
            constraints: Some(constraints),
            tracks,
            ..Default::default()
        }));
        handles.push(Arc::clone(&state));

        Ok(FakeCapture {
            id,
            state,
            level: Arc::clone(&self.level),
        })
    }
}

impl MediaDevices for FakeMediaDevices {
    fn enumerate_devices(&self) -> BoxFuture<'_, Result<Vec<DeviceDescriptor>, MediaError>> {
        Box::pin(async move {
            *self.enumerate_calls.lock() += 1;
            self.devices.lock().clone()
        })
    }

    fn get_user_media(
        &self,
        constraints: CaptureConstraints,
    ) -> BoxFuture<'_, Result<Box<dyn CaptureStream>, MediaError>> {
        Box::pin(async move {
            let capture = self.acquire(constraints)?;
            Ok(Box::new(capture) as Box<dyn CaptureStream>)
        })
    }
}

pub struct FakeCapture {
    id: String,
    state: Arc<Mutex<FakeHandleState>>,
    level: Arc<AtomicU8>,
}

impl CaptureStream for FakeCapture {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        self.state.lock().tracks.clone()
    }

    fn set_audio_enabled(&mut self, enabled: bool) {
        for track in self.state.lock().tracks.iter_mut() {
            if track.kind == DeviceKind::Audio {
                track.enabled = enabled;
            }
        }
    }

    fn stop_video_tracks(&mut self) {
        for track in self.state.lock().tracks.iter_mut() {
            if track.kind == DeviceKind::Video {
                track.live = false;
            }
        }
    }

    fn stop_all_tracks(&mut self) {
        let mut state = self.state.lock();
        state.stop_all_calls += 1;
        for track in state.tracks.iter_mut() {
            track.live = false;
        }
    }

    fn create_analyser(&self, fft_size: usize) -> Result<Box<dyn FrequencyAnalyser>, MediaError> {
        self.state.lock().analysers_created += 1;
        Ok(Box::new(FakeAnalyser {
            bins: fft_size / 2,
            state: Arc::clone(&self.state),
            level: Arc::clone(&self.level),
        }))
    }
}

pub struct FakeAnalyser {
    bins: usize,
    state: Arc<Mutex<FakeHandleState>>,
    level: Arc<AtomicU8>,
}

impl FrequencyAnalyser for FakeAnalyser {
    fn frequency_bin_count(&self) -> usize {
        self.bins
    }

    fn get_byte_frequency_data(&mut self, out: &mut [u8]) {
        self.state.lock().polls += 1;
        out.fill(self.level.load(Ordering::SeqCst));
    }
}

impl Drop for FakeAnalyser {
    fn drop(&mut self) {
        self.state.lock().analysers_closed += 1;
    }
}
