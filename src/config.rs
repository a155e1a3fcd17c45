//! Transport-Konfiguration
//!
//! Defaults passen zu den üblichen Daily-Einstellungen und
//! können über Umgebungsvariablen überschrieben werden.

use std::time::Duration;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Intervall der Audio-Level Observer (lokal und remote)
pub const DEFAULT_AUDIO_LEVEL_INTERVAL_MS: u64 = 100;

pub const ENV_AUDIO_LEVEL_INTERVAL_MS: &str = "RTVI_AUDIO_LEVEL_INTERVAL_MS";
pub const ENV_ALLOW_MULTIPLE_CALL_INSTANCES: &str = "RTVI_ALLOW_MULTIPLE_CALL_INSTANCES";

// ============================================================================
// TRANSPORT CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub audio_level_interval: Duration,
    pub allow_multiple_call_instances: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            audio_level_interval: Duration::from_millis(DEFAULT_AUDIO_LEVEL_INTERVAL_MS),
            allow_multiple_call_instances: true,
        }
    }
}

impl TransportConfig {
    /// Liest die Konfiguration aus der Umgebung
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Baut die Konfiguration aus einer beliebigen Key-Value-Quelle
    ///
    /// Ungültige Werte werden geloggt und durch den Default ersetzt.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_AUDIO_LEVEL_INTERVAL_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.audio_level_interval = Duration::from_millis(ms),
                _ => tracing::warn!(
                    "Ignoring invalid {}={:?}, using {}ms",
                    ENV_AUDIO_LEVEL_INTERVAL_MS,
                    raw,
                    DEFAULT_AUDIO_LEVEL_INTERVAL_MS
                ),
            }
        }

        if let Some(raw) = lookup(ENV_ALLOW_MULTIPLE_CALL_INSTANCES) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.allow_multiple_call_instances = true,
                "0" | "false" | "no" => config.allow_multiple_call_instances = false,
                _ => tracing::warn!(
                    "Ignoring invalid {}={:?}",
                    ENV_ALLOW_MULTIPLE_CALL_INSTANCES,
                    raw
                ),
            }
        }

        config
    }
}
