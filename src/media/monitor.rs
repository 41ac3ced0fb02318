//! Audio-Pegel-Monitor
//!
//! Liest in jedem Frame die Frequenzdaten des Analysers und leitet daraus
//! ein "spricht gerade"-Signal ab. Der Monitor hat einen expliziten
//! Stop-Handle: nach `stop()` wird der Analyser nie wieder abgefragt.

use super::FrequencyAnalyser;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Mittelwert über alle Bins (0.0 - 255.0)
pub fn mean_level(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    bins.iter().map(|&v| v as u32).sum::<u32>() as f32 / bins.len() as f32
}

/// `true` wenn der Mittelwert strikt über der Schwelle liegt
pub fn is_speaking(bins: &[u8], threshold: u8) -> bool {
    !bins.is_empty() && mean_level(bins) > threshold as f32
}

type SharedAnalyser = Arc<Mutex<Option<Box<dyn FrequencyAnalyser>>>>;

/// Besitzt den Poll-Task und den Analyser eines Capture-Handles
pub struct MonitorHandle {
    analyser: SharedAnalyser,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Startet das Polling im festen Intervall
    pub fn start(
        analyser: Box<dyn FrequencyAnalyser>,
        interval: Duration,
        threshold: u8,
        speaking_tx: Arc<watch::Sender<bool>>,
    ) -> Self {
        let bins = analyser.frequency_bin_count();
        let analyser: SharedAnalyser = Arc::new(Mutex::new(Some(analyser)));
        let shared = Arc::clone(&analyser);

        let task = tokio::spawn(async move {
            let mut data = vec![0u8; bins];
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let speaking = {
                    let mut guard = shared.lock();
                    let Some(analyser) = guard.as_mut() else {
                        break;
                    };
                    analyser.get_byte_frequency_data(&mut data);
                    is_speaking(&data, threshold)
                };

                speaking_tx.send_if_modified(|current| {
                    if *current != speaking {
                        *current = speaking;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        tracing::debug!("Audio level monitor started ({} bins)", bins);

        Self {
            analyser,
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.analyser.lock().is_some()
    }

    /// Stoppt das Polling und schließt den Analyser. Mehrfacher Aufruf ist ein No-op.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Drop schließt den Audio-Graphen
        if self.analyser.lock().take().is_some() {
            tracing::debug!("Audio level monitor stopped");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// TESTS
// ============================================================================
