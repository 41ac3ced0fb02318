//! App-Konfiguration
//!
//! Alle Werte kommen aus Umgebungsvariablen, fehlende Variablen fallen auf
//! die Standardwerte zurück:
//! - `FF_CAROUSEL_INTERVAL_MS` - Karussell-Takt (Standard 3000)
//! - `FF_CONNECT_DELAY_MS` - simulierte Verbindungsdauer (Standard 2000)
//! - `FF_SPEAKING_THRESHOLD` - Sprech-Schwelle 0-255 (Standard 80)
//! - `FF_SAMPLE_INTERVAL_MS` - Abtastintervall des Pegel-Monitors (Standard 16)

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const DEFAULT_CAROUSEL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_CONNECT_DELAY_MS: u64 = 2000;
pub const DEFAULT_SPEAKING_THRESHOLD: u8 = 80;

/// ~60 fps, entspricht einem Animation-Frame
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 16;

/// FFT-Größe des Analysers (ergibt 128 Frequenz-Bins)
pub const FFT_SIZE: usize = 256;

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

// ============================================================================
// APP CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub carousel_interval: Duration,
    pub connect_delay: Duration,
    pub speaking_threshold: u8,
    pub sample_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            carousel_interval: Duration::from_millis(DEFAULT_CAROUSEL_INTERVAL_MS),
            connect_delay: Duration::from_millis(DEFAULT_CONNECT_DELAY_MS),
            speaking_threshold: DEFAULT_SPEAKING_THRESHOLD,
            sample_interval: Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS),
        }
    }
}

impl AppConfig {
    /// Liest die Konfiguration aus der Prozess-Umgebung
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Liest die Konfiguration über eine beliebige Lookup-Funktion
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let carousel_ms = parse_var(&lookup, "FF_CAROUSEL_INTERVAL_MS")?
            .unwrap_or(DEFAULT_CAROUSEL_INTERVAL_MS);
        let connect_ms =
            parse_var(&lookup, "FF_CONNECT_DELAY_MS")?.unwrap_or(DEFAULT_CONNECT_DELAY_MS);
        let sample_ms =
            parse_var(&lookup, "FF_SAMPLE_INTERVAL_MS")?.unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS);
        let threshold =
            parse_var(&lookup, "FF_SPEAKING_THRESHOLD")?.unwrap_or(defaults.speaking_threshold);

        // Ein Intervall von 0 würde tokio::time::interval panicken lassen
        if carousel_ms == 0 {
            return Err(invalid("FF_CAROUSEL_INTERVAL_MS", "0"));
        }
        if sample_ms == 0 {
            return Err(invalid("FF_SAMPLE_INTERVAL_MS", "0"));
        }

        Ok(Self {
            carousel_interval: Duration::from_millis(carousel_ms),
            connect_delay: Duration::from_millis(connect_ms),
            speaking_threshold: threshold,
            sample_interval: Duration::from_millis(sample_ms),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(key, &raw)),
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.carousel_interval, Duration::from_millis(3000));
        assert_eq!(config.connect_delay, Duration::from_millis(2000));
        assert_eq!(config.speaking_threshold, 80);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("FF_CONNECT_DELAY_MS", "500"),
            ("FF_SPEAKING_THRESHOLD", " 120 "),
        ]))
        .unwrap();

        assert_eq!(config.connect_delay, Duration::from_millis(500));
        assert_eq!(config.speaking_threshold, 120);
        assert_eq!(config.carousel_interval, Duration::from_millis(3000));
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup_from(&[("FF_SPEAKING_THRESHOLD", "300")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "FF_SPEAKING_THRESHOLD",
                value: "300".to_string()
            }
        );

        assert!(AppConfig::from_lookup(lookup_from(&[("FF_CAROUSEL_INTERVAL_MS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("FF_CONNECT_DELAY_MS", "soon")])).is_err());
    }
}
