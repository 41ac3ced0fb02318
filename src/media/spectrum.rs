//! Frequenz-Spektrum wie ein Web-Audio `AnalyserNode`
//!
//! Blackman-Fenster, DFT, zeitliche Glättung und Abbildung von
//! `MIN_DECIBELS..MAX_DECIBELS` auf 0..255. Damit liefert der Desktop-
//! Analyser die gleiche Skala wie `getByteFrequencyData`.

use std::f32::consts::PI;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const MIN_DECIBELS: f32 = -100.0;
pub const MAX_DECIBELS: f32 = -30.0;
pub const SMOOTHING_TIME_CONSTANT: f32 = 0.8;

// ============================================================================
// SPECTRUM ANALYSER
// ============================================================================

pub struct SpectrumAnalyser {
    fft_size: usize,
    window: Vec<f32>,
    /// Twiddle-Tabelle (cos, sin) für `2πj/N`
    twiddles: Vec<(f32, f32)>,
    smoothed: Vec<f32>,
    frame: Vec<f32>,
}

impl SpectrumAnalyser {
    /// `fft_size` muss gerade und > 0 sein
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(2) & !1;
        let n = fft_size as f32;

        let window = (0..fft_size)
            .map(|i| {
                let x = i as f32 / n;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();

        let twiddles = (0..fft_size)
            .map(|j| {
                let angle = 2.0 * PI * j as f32 / n;
                (angle.cos(), angle.sin())
            })
            .collect();

        Self {
            fft_size,
            window,
            twiddles,
            smoothed: vec![0.0; fft_size / 2],
            frame: vec![0.0; fft_size],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Berechnet die Byte-Werte aus den jüngsten Samples.
    ///
    /// Weniger als `fft_size` Samples werden vorne mit Stille aufgefüllt.
    pub fn process(&mut self, samples: &[f32], out: &mut [u8]) {
        let n = self.fft_size;
        let take = samples.len().min(n);
        let pad = n - take;

        self.frame[..pad].fill(0.0);
        for (i, sample) in samples[samples.len() - take..].iter().enumerate() {
            self.frame[pad + i] = sample * self.window[pad + i];
        }

        let scale = 255.0 / (MAX_DECIBELS - MIN_DECIBELS);

        for k in 0..self.bin_count() {
            let mut re = 0.0f32;
            let mut im = 0.0f32;
            for (i, x) in self.frame.iter().enumerate() {
                let (cos, sin) = self.twiddles[(k * i) % n];
                re += x * cos;
                im -= x * sin;
            }
            let magnitude = (re * re + im * im).sqrt() / n as f32;

            let smoothed = SMOOTHING_TIME_CONSTANT * self.smoothed[k]
                + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;
            self.smoothed[k] = if smoothed.is_finite() { smoothed } else { 0.0 };

            if let Some(slot) = out.get_mut(k) {
                *slot = if self.smoothed[k] <= 0.0 {
                    0
                } else {
                    let db = 20.0 * self.smoothed[k].log10();
                    (scale * (db - MIN_DECIBELS)).clamp(0.0, 255.0) as u8
                };
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
