//! Screen-Verwaltung
//!
//! Besitzt Router, Landing Page und den (optionalen) Home Screen. Eine
//! Navigation baut den verlassenen Screen ab und mountet den neuen, in
//! einem Schritt über `&mut self`. Der Aufrufer hält dafür einen Lock über
//! die gesamte Navigation, damit kein zweiter Mount dazwischenkommt.

use crate::config::AppConfig;
use crate::home::{HomeEvent, HomeScreen};
use crate::landing::LandingScreen;
use crate::media::MediaDevices;
use crate::router::{Route, RouteError, Router};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Ergebnis einer Navigation
#[derive(Debug)]
pub struct Navigation {
    pub route: Route,
    /// Nur gesetzt, wenn ein neuer Home Screen gemountet wurde. Der Receiver
    /// existiert vor dem Mount, es geht also kein Event verloren.
    pub home_events: Option<broadcast::Receiver<HomeEvent>>,
}

pub struct Screens {
    config: AppConfig,
    devices: Arc<dyn MediaDevices>,
    router: Router,
    landing: LandingScreen,
    home: Option<HomeScreen>,
}

impl Screens {
    pub fn new(devices: Arc<dyn MediaDevices>, config: AppConfig) -> Self {
        Self {
            landing: LandingScreen::new(config.carousel_interval),
            config,
            devices,
            router: Router::new(),
            home: None,
        }
    }

    pub fn current(&self) -> Route {
        self.router.current()
    }

    pub fn landing(&self) -> &LandingScreen {
        &self.landing
    }

    pub fn home(&self) -> Option<&HomeScreen> {
        self.home.as_ref()
    }

    pub fn home_mut(&mut self) -> Option<&mut HomeScreen> {
        self.home.as_mut()
    }

    /// Wechselt den Screen und startet bzw. beendet dessen Ressourcen
    pub async fn navigate(&mut self, path: &str) -> Result<Navigation, RouteError> {
        let transition = self.router.navigate(path)?;

        if transition.leaves(Route::Landing) {
            self.landing.unmount();
        }
        if transition.leaves(Route::Home) {
            if let Some(mut home) = self.home.take() {
                home.teardown();
            }
        }

        let mut home_events = None;
        match transition.to {
            Route::Landing => {
                if !self.landing.ticker().is_running() {
                    self.landing.mount();
                }
            }
            Route::Home => {
                if self.home.is_none() {
                    let mut home = HomeScreen::new(Arc::clone(&self.devices), &self.config);
                    home_events = Some(home.subscribe());
                    home.mount().await;
                    self.home = Some(home);
                }
            }
        }

        Ok(Navigation {
            route: transition.to,
            home_events,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
