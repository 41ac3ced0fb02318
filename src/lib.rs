//! Finding Friends - Video-Chat Oberfläche
//!
//! Zwei Screens:
//! - Landing Page mit automatisch laufendem Karten-Karussell
//! - Home Screen mit Namenseingabe, Kamera-Vorschau, Mikrofon-Pegel,
//!   Geräteauswahl und einem simulierten Gesprächspartner
//!
//! Die Plattform (Kameras, Mikrofone, Frequenz-Analyse) wird über die
//! Traits in [`media`] angebunden. Mit dem Feature `desktop` läuft das
//! Ganze als Tauri-Anwendung.

#[cfg(feature = "desktop")]
pub mod app;
pub mod catalog;
pub mod config;
pub mod home;
pub mod landing;
pub mod media;
pub mod router;
pub mod screens;

pub use catalog::{Card, CARDS};
pub use config::{AppConfig, ConfigError};
pub use home::{HomeError, HomeEvent, HomeScreen, HomeView};
pub use landing::{LandingContent, LandingEvent, LandingScreen};
pub use media::{MediaDevices, MediaError, MediaSession};
pub use router::{Route, RouteError, Router};
pub use screens::{Navigation, Screens};

#[cfg(feature = "desktop")]
pub use app::run;
