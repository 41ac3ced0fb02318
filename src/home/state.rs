//! Zustand des Home Screens
//!
//! `NameEntry -> Active`, nur in diese Richtung. Alle Schalter leben in
//! [`ActiveSession`], damit ungültige Kombinationen nicht darstellbar sind.

use crate::media::{DeviceKind, MediaError};
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HomeError {
    #[error("Please enter your name.")]
    EmptyName,

    #[error("Name has not been entered yet")]
    NotActive,

    #[error("Name was already entered")]
    AlreadyActive,

    #[error("Unknown {kind} device: {id}")]
    UnknownDevice { kind: DeviceKind, id: String },

    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub name: String,
    pub camera_on: bool,
    pub muted: bool,
    pub settings_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeState {
    NameEntry { draft: String },
    Active(ActiveSession),
}

impl Default for HomeState {
    fn default() -> Self {
        HomeState::NameEntry {
            draft: String::new(),
        }
    }
}

impl HomeState {
    pub fn is_active(&self) -> bool {
        matches!(self, HomeState::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match self {
            HomeState::Active(session) => Some(session),
            HomeState::NameEntry { .. } => None,
        }
    }

    pub fn active_mut(&mut self) -> Result<&mut ActiveSession, HomeError> {
        match self {
            HomeState::Active(session) => Ok(session),
            HomeState::NameEntry { .. } => Err(HomeError::NotActive),
        }
    }

    /// Kamera ist vor der Namenseingabe immer aus
    pub fn camera_enabled(&self) -> bool {
        self.active().map(|s| s.camera_on).unwrap_or(false)
    }

    pub fn set_draft(&mut self, value: &str) -> Result<(), HomeError> {
        match self {
            HomeState::NameEntry { draft } => {
                *draft = value.to_string();
                Ok(())
            }
            HomeState::Active(_) => Err(HomeError::AlreadyActive),
        }
    }

    /// Übergang `NameEntry -> Active` bei nicht-leerem Namen
    pub fn submit_name(&mut self, name: &str) -> Result<&ActiveSession, HomeError> {
        if self.is_active() {
            return Err(HomeError::AlreadyActive);
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(HomeError::EmptyName);
        }

        *self = HomeState::Active(ActiveSession {
            name: name.to_string(),
            camera_on: false,
            muted: false,
            settings_open: false,
        });

        match self {
            HomeState::Active(session) => Ok(session),
            HomeState::NameEntry { .. } => Err(HomeError::NotActive),
        }
    }

    /// Username in den Einstellungen ändern
    pub fn rename(&mut self, name: &str) -> Result<(), HomeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HomeError::EmptyName);
        }
        self.active_mut()?.name = name.to_string();
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_stays_in_name_entry() {
        let mut state = HomeState::default();

        assert_eq!(state.submit_name(""), Err(HomeError::EmptyName));
        assert_eq!(state.submit_name("   \t"), Err(HomeError::EmptyName));
        assert!(!state.is_active());
    }

    #[test]
    fn test_submit_name_activates() {
        let mut state = HomeState::default();
        state.set_draft("Ali").unwrap();

        let active = state.submit_name("  Alice ").unwrap();
        assert_eq!(active.name, "Alice");
        assert!(!active.camera_on);
        assert!(!active.muted);
        assert!(!active.settings_open);

        // Einweg
        assert_eq!(state.submit_name("Bob"), Err(HomeError::AlreadyActive));
        assert_eq!(state.set_draft("x"), Err(HomeError::AlreadyActive));
    }

    #[test]
    fn test_rename() {
        let mut state = HomeState::default();
        assert_eq!(state.rename("Bob"), Err(HomeError::NotActive));

        state.submit_name("Alice").unwrap();
        assert_eq!(state.rename(" "), Err(HomeError::EmptyName));
        state.rename("Bob").unwrap();
        assert_eq!(state.active().unwrap().name, "Bob");
    }

    #[test]
    fn test_camera_enabled_only_when_active() {
        let mut state = HomeState::default();
        assert!(!state.camera_enabled());
        state.submit_name("Alice").unwrap();
        state.active_mut().unwrap().camera_on = true;
        assert!(state.camera_enabled());
    }
}
