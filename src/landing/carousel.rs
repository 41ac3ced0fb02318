//! Endlos-Karussell der Landing Page
//!
//! Der Index wächst unbegrenzt, die horizontale Verschiebung wird aber
//! immer modulo Katalog-Länge berechnet. Da die Karten doppelt gerendert
//! werden, ist der Sprung am Ende nicht sichtbar.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Breite einer Karte in Prozent der Spur (4 Karten sichtbar, 150% Spur)
pub const CARD_WIDTH_PERCENT: f64 = 150.0 / 4.0;

// ============================================================================
// CAROUSEL STATE
// ============================================================================

#[derive(Debug, Clone)]
pub struct Carousel {
    index: u64,
    hovered: bool,
    len: usize,
}

/// Serialisierbarer Schnappschuss für das Frontend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselState {
    pub index: u64,
    pub position: usize,
    pub offset_percent: f64,
    pub transform: String,
    pub hovered: bool,
}

impl Carousel {
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            hovered: false,
            len,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Rückt um eine Karte weiter
    pub fn advance(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    /// Setzt den Hover-Status, gibt `true` zurück wenn er sich geändert hat
    pub fn set_hovered(&mut self, hovered: bool) -> bool {
        let changed = self.hovered != hovered;
        self.hovered = hovered;
        changed
    }

    /// Position im Katalog, immer in `[0, len)`
    pub fn position(&self) -> usize {
        if self.len == 0 {
            return 0;
        }
        (self.index % self.len as u64) as usize
    }

    pub fn offset_percent(&self) -> f64 {
        self.position() as f64 * CARD_WIDTH_PERCENT
    }

    pub fn transform(&self) -> String {
        format!("translateX(-{}%)", self.offset_percent())
    }

    pub fn state(&self) -> CarouselState {
        CarouselState {
            index: self.index,
            position: self.position(),
            offset_percent: self.offset_percent(),
            transform: self.transform(),
            hovered: self.hovered,
        }
    }
}

// ============================================================================
// TICKER
// ============================================================================

/// Events der Landing Page
#[derive(Debug, Clone)]
pub enum LandingEvent {
    Advanced(CarouselState),
}

/// Treibt das Karussell im festen Takt an, pausiert bei Hover
pub struct CarouselTicker {
    carousel: Arc<Mutex<Carousel>>,
    interval: Duration,
    event_tx: broadcast::Sender<LandingEvent>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CarouselTicker {
    pub fn new(carousel: Carousel, interval: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(32);

        Self {
            carousel: Arc::new(Mutex::new(carousel)),
            interval,
            event_tx,
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LandingEvent> {
        self.event_tx.subscribe()
    }

    pub fn state(&self) -> CarouselState {
        self.carousel.lock().state()
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Startet den Takt neu (nicht bei Hover)
    pub fn start(&self) {
        if self.carousel.lock().is_hovered() {
            return;
        }

        let carousel = Arc::clone(&self.carousel);
        let event_tx = self.event_tx.clone();
        let period = self.interval;

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                let state = {
                    let mut carousel = carousel.lock();
                    carousel.advance();
                    carousel.state()
                };
                tracing::debug!("Carousel advanced to {}", state.index);
                let _ = event_tx.send(LandingEvent::Advanced(state));
            }
        });

        if let Some(previous) = self.task.lock().replace(task) {
            previous.abort();
        }
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// Stoppt den Takt und vergisst den Hover-Zustand. Ein verstecktes
    /// Karussell bekommt kein `mouseleave` mehr.
    pub fn reset(&self) {
        self.stop();
        self.carousel.lock().set_hovered(false);
    }

    /// Hover pausiert, Verlassen setzt ab dem gleichen Index fort
    pub fn set_hovered(&self, hovered: bool) -> CarouselState {
        let changed = self.carousel.lock().set_hovered(hovered);

        if changed {
            if hovered {
                self.stop();
            } else {
                self.start();
            }
        }

        self.state()
    }
}

impl Drop for CarouselTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// TESTS
// ============================================================================
