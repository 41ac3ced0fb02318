//! Desktop-Shell - Tauri Commands und Event-Weiterleitung
//!
//! Verbindet das Webview mit Landing Page, Home Screen und Router.

use crate::config::AppConfig;
use crate::home::{HomeEvent, HomeScreen, HomeView};
use crate::landing::{CarouselState, LandingContent, LandingEvent};
use crate::media::desktop::DesktopMediaDevices;
use crate::media::{DeviceDescriptor, MediaDevices};
use crate::router::Route;
use crate::screens::Screens;
use parking_lot::Mutex;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager, State};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Standard-Filter wenn `RUST_LOG` nicht gesetzt ist
const DEFAULT_LOG_FILTER: &str = "finding_friends_lib=debug,finding_friends=info";

const NOT_MOUNTED: &str = "Home screen is not mounted";

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Globaler Application State
pub struct AppState {
    devices: Arc<DesktopMediaDevices>,
    /// Ein Lock für Router und Screens, Navigationen laufen nacheinander
    screens: tokio::sync::Mutex<Screens>,
    landing_forwarder: Mutex<Option<JoinHandle<()>>>,
    home_forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let devices = Arc::new(DesktopMediaDevices::new());
        let screens = Screens::new(Arc::clone(&devices) as Arc<dyn MediaDevices>, config);

        Self {
            devices,
            screens: tokio::sync::Mutex::new(screens),
            landing_forwarder: Mutex::new(None),
            home_forwarder: Mutex::new(None),
        }
    }

    fn ensure_landing_forwarder(&self, screens: &Screens, app_handle: &AppHandle) {
        let mut forwarder = self.landing_forwarder.lock();
        if forwarder.is_some() {
            return;
        }

        let mut rx = screens.landing().ticker().subscribe();
        let app_handle = app_handle.clone();
        *forwarder = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(LandingEvent::Advanced(state)) => {
                        let _ = app_handle.emit("carousel:advanced", &state);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Dropped {} carousel events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }
}

// ============================================================================
// TAURI COMMANDS - ROUTING
// ============================================================================

/// Wechselt den Screen und startet bzw. beendet dessen Ressourcen
#[tauri::command]
async fn navigate(
    path: String,
    state: State<'_, Arc<AppState>>,
    app_handle: AppHandle,
) -> Result<Route, String> {
    let mut screens = state.screens.lock().await;
    state.ensure_landing_forwarder(&screens, &app_handle);

    let navigation = screens.navigate(&path).await.map_err(|e| e.to_string())?;

    if navigation.route != Route::Home {
        if let Some(forwarder) = state.home_forwarder.lock().take() {
            forwarder.abort();
        }
    }

    // Noch unter dem Screens-Lock, damit der Forwarder zum gespeicherten Screen gehört
    if let Some(rx) = navigation.home_events {
        let forwarder = tokio::spawn(forward_home_events(rx, app_handle.clone()));
        if let Some(previous) = state.home_forwarder.lock().replace(forwarder) {
            previous.abort();
        }
    }

    Ok(navigation.route)
}

// ============================================================================
// TAURI COMMANDS - LANDING
// ============================================================================

#[tauri::command]
async fn landing_content(state: State<'_, Arc<AppState>>) -> Result<LandingContent, String> {
    Ok(state.screens.lock().await.landing().content())
}

#[tauri::command]
async fn carousel_state(state: State<'_, Arc<AppState>>) -> Result<CarouselState, String> {
    Ok(state.screens.lock().await.landing().ticker().state())
}

/// Hover pausiert das Karussell
#[tauri::command]
async fn carousel_hover(
    hovered: bool,
    state: State<'_, Arc<AppState>>,
) -> Result<CarouselState, String> {
    let screens = state.screens.lock().await;
    if screens.current() != Route::Landing {
        return Ok(screens.landing().ticker().state());
    }
    Ok(screens.landing().ticker().set_hovered(hovered))
}

/// Call-to-Action, gibt den Zielpfad zurück
#[tauri::command]
async fn activate_cta(state: State<'_, Arc<AppState>>) -> Result<String, String> {
    Ok(state.screens.lock().await.landing().activate().path().to_string())
}

// ============================================================================
// TAURI COMMANDS - DEVICES
// ============================================================================

/// Das Webview meldet seine Kameras (enumerateDevices)
#[tauri::command]
async fn report_video_devices(
    devices: Vec<DeviceDescriptor>,
    state: State<'_, Arc<AppState>>,
) -> Result<(), String> {
    state.devices.report_cameras(devices);
    Ok(())
}

// ============================================================================
// TAURI COMMANDS - HOME
// ============================================================================

#[tauri::command]
async fn home_view(state: State<'_, Arc<AppState>>) -> Result<HomeView, String> {
    let screens = state.screens.lock().await;
    let home = screens.home().ok_or(NOT_MOUNTED)?;
    Ok(home.view())
}

#[tauri::command]
async fn set_name_draft(draft: String, state: State<'_, Arc<AppState>>) -> Result<(), String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.set_name_draft(&draft).map_err(|e| e.to_string())
}

#[tauri::command]
async fn submit_name(name: String, state: State<'_, Arc<AppState>>) -> Result<HomeView, String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.submit_name(&name).map_err(|e| e.to_string())?;
    Ok(home.view())
}

#[tauri::command]
async fn rename(name: String, state: State<'_, Arc<AppState>>) -> Result<(), String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.rename(&name).map_err(|e| e.to_string())
}

/// Gibt den neuen Mute-Status zurück
#[tauri::command]
async fn toggle_mute(state: State<'_, Arc<AppState>>) -> Result<bool, String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.toggle_mute().map_err(|e| e.to_string())
}

/// Gibt den neuen Kamera-Status zurück
#[tauri::command]
async fn toggle_camera(state: State<'_, Arc<AppState>>) -> Result<bool, String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.toggle_camera().await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn open_settings(state: State<'_, Arc<AppState>>) -> Result<(), String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.open_settings().map_err(|e| e.to_string())
}

#[tauri::command]
async fn close_settings(state: State<'_, Arc<AppState>>) -> Result<(), String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.close_settings().map_err(|e| e.to_string())
}

#[tauri::command]
async fn select_video_device(id: String, state: State<'_, Arc<AppState>>) -> Result<(), String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.select_video_device(&id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn select_audio_device(id: String, state: State<'_, Arc<AppState>>) -> Result<(), String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.select_audio_device(&id)
        .await
        .map_err(|e| e.to_string())
}

/// Startet die (simulierte) Verbindung zu einem anderen Benutzer
#[tauri::command]
async fn connect(state: State<'_, Arc<AppState>>) -> Result<(), String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.connect().map_err(|e| e.to_string())
}

#[tauri::command]
async fn disconnect(state: State<'_, Arc<AppState>>) -> Result<(), String> {
    let mut screens = state.screens.lock().await;
    let home = home_mut(&mut screens)?;
    home.disconnect().map_err(|e| e.to_string())
}

fn home_mut(screens: &mut Screens) -> Result<&mut HomeScreen, String> {
    screens.home_mut().ok_or_else(|| NOT_MOUNTED.to_string())
}

// ============================================================================
// EVENT HANDLER
// ============================================================================

/// Leitet Home-Events an das Frontend weiter
async fn forward_home_events(
    mut rx: tokio::sync::broadcast::Receiver<HomeEvent>,
    app_handle: AppHandle,
) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Dropped {} home events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event {
            HomeEvent::StateChanged => {
                let _ = app_handle.emit("home:state_changed", ());
            }
            HomeEvent::Speaking(speaking) => {
                let _ = app_handle.emit("home:speaking", speaking);
            }
            HomeEvent::Preview { video_device_id } => {
                tracing::debug!("Preview device: {:?}", video_device_id);
                let _ = app_handle.emit(
                    "home:preview",
                    serde_json::json!({ "videoDeviceId": video_device_id }),
                );
            }
            HomeEvent::Notice(message) => {
                let _ = app_handle.emit("home:notice", message);
            }
            HomeEvent::PeerConnected { remote } => {
                let _ = app_handle.emit("peer:connected", remote);
            }
            HomeEvent::PeerDisconnected => {
                let _ = app_handle.emit("peer:disconnected", ());
            }
        }
    }
}

// ============================================================================
// TAURI APP RUNNER
// ============================================================================

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

/// Startet die Tauri-Anwendung
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    if let Err(e) = init_tracing() {
        eprintln!("{e}");
    }

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("{}, falling back to defaults", e);
        AppConfig::default()
    });
    tracing::info!("Starting Finding Friends with {:?}", config);

    let state = Arc::new(AppState::new(config));

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            if let Some(window) = app.get_webview_window("main") {
                let _ = window.set_focus();
            }
        }))
        .plugin(tauri_plugin_opener::init())
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            // Routing
            navigate,
            // Landing
            landing_content,
            carousel_state,
            carousel_hover,
            activate_cta,
            // Devices
            report_video_devices,
            // Home
            home_view,
            set_name_draft,
            submit_name,
            rename,
            toggle_mute,
            toggle_camera,
            open_settings,
            close_settings,
            select_video_device,
            select_audio_device,
            connect,
            disconnect,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
