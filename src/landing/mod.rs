//! Landing Page
//!
//! Titel, Beschreibung, Call-to-Action und das Karten-Karussell.

pub mod carousel;

pub use carousel::{Carousel, CarouselState, CarouselTicker, LandingEvent, CARD_WIDTH_PERCENT};

use crate::catalog::{self, Card};
use crate::router::Route;
use serde::Serialize;
use std::time::Duration;

pub const TITLE: &str = "Finding Friends";
pub const DESCRIPTION: &str =
    "Connect With People Instantly And Chat With Multiple Users In Real time";
pub const CTA_LABEL: &str = "Start Chatting";
pub const CTA_HOVER_LABEL: &str = "Let's Connect";

/// Statischer Inhalt der Landing Page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingContent {
    pub title: &'static str,
    pub description: &'static str,
    pub cta_label: &'static str,
    pub cta_hover_label: &'static str,
    /// Karussell-Spur (Katalog doppelt)
    pub cards: Vec<Card>,
}

pub struct LandingScreen {
    ticker: CarouselTicker,
}

impl LandingScreen {
    pub fn new(carousel_interval: Duration) -> Self {
        Self {
            ticker: CarouselTicker::new(Carousel::new(catalog::cards().len()), carousel_interval),
        }
    }

    pub fn content(&self) -> LandingContent {
        LandingContent {
            title: TITLE,
            description: DESCRIPTION,
            cta_label: CTA_LABEL,
            cta_hover_label: CTA_HOVER_LABEL,
            cards: catalog::carousel_track(),
        }
    }

    pub fn ticker(&self) -> &CarouselTicker {
        &self.ticker
    }

    /// Startet das Karussell
    pub fn mount(&self) {
        self.ticker.start();
    }

    pub fn unmount(&self) {
        self.ticker.reset();
    }

    /// Call-to-Action: führt zum Home Screen
    pub fn activate(&self) -> Route {
        tracing::info!("Call to action activated");
        Route::Home
    }
}
