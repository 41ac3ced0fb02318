//! Desktop-Backend
//!
//! Mikrofone kommen über cpal, Kameras meldet das Webview (es besitzt die
//! Kamerabilder und bindet sie an das Vorschau-`<video>`). Für das Mikrofon
//! landet das Signal in einem Ring-Buffer, aus dem der Analyser die jüngsten
//! Samples liest.

use super::spectrum::SpectrumAnalyser;
use super::{
    CaptureConstraints, CaptureStream, DeviceDescriptor, DeviceKind, FrequencyAnalyser,
    MediaDevices, MediaError, TrackInfo,
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, SupportedStreamConfigRange};
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use ringbuf::{traits::*, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Bevorzugte Sample Rate
pub const SAMPLE_RATE: u32 = 48000;

/// Puffer für die Analyse (mehrere FFT-Fenster)
const RING_BUFFER_SIZE: usize = 4096;

type SampleBuffer = Arc<Mutex<HeapRb<f32>>>;

// ============================================================================
// MEDIA DEVICES
// ============================================================================

pub struct DesktopMediaDevices {
    /// Vom Webview gemeldete Kameras
    cameras: RwLock<Vec<DeviceDescriptor>>,
}

impl DesktopMediaDevices {
    pub fn new() -> Self {
        Self {
            cameras: RwLock::new(Vec::new()),
        }
    }

    /// Übernimmt die Kamera-Liste aus dem Webview
    pub fn report_cameras(&self, devices: Vec<DeviceDescriptor>) {
        let cameras: Vec<_> = devices
            .into_iter()
            .filter(|d| d.kind == DeviceKind::Video)
            .collect();
        tracing::info!("Webview reported {} camera(s)", cameras.len());
        *self.cameras.write() = cameras;
    }

    fn audio_inputs() -> Result<Vec<DeviceDescriptor>, MediaError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| MediaError::EnumerationFailed(e.to_string()))?
            .filter_map(|d| {
                d.name()
                    .ok()
                    .map(|name| DeviceDescriptor::new(name.clone(), name, DeviceKind::Audio))
            })
            .collect();
        Ok(devices)
    }

    /// Findet ein Mikrofon per Name, ohne ID das Standardgerät
    fn find_input(id: Option<&str>) -> Result<Device, MediaError> {
        let host = cpal::default_host();

        let Some(id) = id else {
            return host
                .default_input_device()
                .ok_or(MediaError::NotFound(DeviceKind::Audio));
        };

        host.input_devices()
            .map_err(|e| MediaError::Backend(e.to_string()))?
            .find(|d| d.name().map(|name| name == id).unwrap_or(false))
            .ok_or(MediaError::NotFound(DeviceKind::Audio))
    }

    fn resolve_camera(&self, id: Option<&str>) -> Result<String, MediaError> {
        let cameras = self.cameras.read();
        let found = match id {
            Some(id) => cameras.iter().find(|d| d.id == id),
            None => cameras.first(),
        };
        found
            .map(|d| d.id.clone())
            .ok_or(MediaError::NotFound(DeviceKind::Video))
    }

    fn open(&self, constraints: CaptureConstraints) -> Result<DesktopCapture, MediaError> {
        let camera = match &constraints.video {
            Some(video) => Some(self.resolve_camera(video.device_id.as_deref())?),
            None => None,
        };

        let device = Self::find_input(constraints.audio.device_id.as_deref())?;
        let audio_device = device.name().unwrap_or_else(|_| "unknown".to_string());
        let config = find_best_input_config(&device)?;

        tracing::info!(
            "Starting audio capture on '{}': {} Hz, {} channels",
            audio_device,
            config.sample_rate.0,
            config.channels
        );

        let samples: SampleBuffer = Arc::new(Mutex::new(HeapRb::new(RING_BUFFER_SIZE)));
        let audio_enabled = Arc::new(AtomicBool::new(true));

        let buffer = Arc::clone(&samples);
        let enabled = Arc::clone(&audio_enabled);
        let channels = config.channels.max(1) as usize;

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let live = enabled.load(Ordering::Relaxed);
                    let mut buffer = buffer.lock();
                    // Auf Mono mischen, stumm = Stille
                    for frame in data.chunks(channels) {
                        let sample = if live {
                            frame.iter().sum::<f32>() / frame.len() as f32
                        } else {
                            0.0
                        };
                        buffer.push_overwrite(sample);
                    }
                },
                |err| {
                    tracing::error!("Audio capture error: {}", err);
                },
                None,
            )
            .map_err(|e| MediaError::Backend(e.to_string()))?;

        stream
            .play()
            .map_err(|e| MediaError::Backend(e.to_string()))?;

        Ok(DesktopCapture {
            id: uuid::Uuid::new_v4().to_string(),
            stream: Some(stream),
            audio_device,
            audio_enabled,
            audio_live: true,
            camera: camera.map(|device_id| CameraTrack {
                device_id,
                live: true,
            }),
            samples,
        })
    }
}

impl Default for DesktopMediaDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaDevices for DesktopMediaDevices {
    fn enumerate_devices(&self) -> BoxFuture<'_, Result<Vec<DeviceDescriptor>, MediaError>> {
        Box::pin(async move {
            let mut devices = self.cameras.read().clone();
            devices.extend(Self::audio_inputs()?);
            Ok(devices)
        })
    }

    fn get_user_media(
        &self,
        constraints: CaptureConstraints,
    ) -> BoxFuture<'_, Result<Box<dyn CaptureStream>, MediaError>> {
        Box::pin(async move {
            let capture = self.open(constraints)?;
            Ok(Box::new(capture) as Box<dyn CaptureStream>)
        })
    }
}

// ============================================================================
// CAPTURE
// ============================================================================

/// Kamera-Spur. Die Bilder selbst liegen im Webview.
struct CameraTrack {
    device_id: String,
    live: bool,
}

pub struct DesktopCapture {
    id: String,
    stream: Option<Stream>,
    audio_device: String,
    audio_enabled: Arc<AtomicBool>,
    audio_live: bool,
    camera: Option<CameraTrack>,
    samples: SampleBuffer,
}

// cpal::Stream ist nicht Send, wird aber nur vom Besitzer angefasst
unsafe impl Send for DesktopCapture {}

impl CaptureStream for DesktopCapture {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        let mut tracks = Vec::with_capacity(2);
        if let Some(camera) = &self.camera {
            tracks.push(TrackInfo {
                kind: DeviceKind::Video,
                device_id: Some(camera.device_id.clone()),
                live: camera.live,
                enabled: true,
            });
        }
        tracks.push(TrackInfo {
            kind: DeviceKind::Audio,
            device_id: Some(self.audio_device.clone()),
            live: self.audio_live,
            enabled: self.audio_enabled.load(Ordering::Relaxed),
        });
        tracks
    }

    fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled.store(enabled, Ordering::Relaxed);
    }

    fn stop_video_tracks(&mut self) {
        if let Some(camera) = self.camera.as_mut() {
            camera.live = false;
        }
    }

    fn stop_all_tracks(&mut self) {
        self.stop_video_tracks();
        // Drop stoppt den cpal Stream
        self.stream = None;
        self.audio_live = false;
    }

    fn create_analyser(&self, fft_size: usize) -> Result<Box<dyn FrequencyAnalyser>, MediaError> {
        if !self.audio_live {
            return Err(MediaError::Backend("audio track already stopped".to_string()));
        }
        Ok(Box::new(DesktopAnalyser {
            spectrum: SpectrumAnalyser::new(fft_size),
            samples: Arc::clone(&self.samples),
            window: Vec::with_capacity(fft_size),
        }))
    }
}

// ============================================================================
// ANALYSER
// ============================================================================

pub struct DesktopAnalyser {
    spectrum: SpectrumAnalyser,
    samples: SampleBuffer,
    window: Vec<f32>,
}

impl FrequencyAnalyser for DesktopAnalyser {
    fn frequency_bin_count(&self) -> usize {
        self.spectrum.bin_count()
    }

    fn get_byte_frequency_data(&mut self, out: &mut [u8]) {
        let n = self.spectrum.fft_size();
        self.window.clear();
        {
            let buffer = self.samples.lock();
            let skip = buffer.occupied_len().saturating_sub(n);
            self.window.extend(buffer.iter().skip(skip).copied());
        }
        self.spectrum.process(&self.window, out);
    }
}

// ============================================================================
// CONFIG SELECTION
// ============================================================================

fn find_best_input_config(device: &Device) -> Result<StreamConfig, MediaError> {
    let configs = device
        .supported_input_configs()
        .map_err(|e| MediaError::UnsupportedConfig(e.to_string()))?;

    select_best_config(configs.collect())
}

/// Priorität: F32 mit 48kHz > F32 mit anderer Rate
fn select_best_config(configs: Vec<SupportedStreamConfigRange>) -> Result<StreamConfig, MediaError> {
    let target_rate = cpal::SampleRate(SAMPLE_RATE);

    let f32_configs = configs
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32);

    for config in f32_configs.clone() {
        if config.min_sample_rate() <= target_rate && config.max_sample_rate() >= target_rate {
            return Ok(config.clone().with_sample_rate(target_rate).into());
        }
    }

    if let Some(config) = f32_configs.into_iter().next() {
        return Ok(config.clone().with_max_sample_rate().into());
    }

    Err(MediaError::UnsupportedConfig(
        "No f32 input configuration found".to_string(),
    ))
}
