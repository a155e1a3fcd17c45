//! RTVI Daily Transport
//!
//! Transport-Adapter, der einen RTVI Client an ein Daily Call-Objekt bindet:
//! - Daily übernimmt Media-Transport, Geräte und Netzwerk
//! - Der Adapter übersetzt Daily-Events in RTVI-Callbacks
//! - RTVI-Steuernachrichten laufen über den Data-Channel des Calls

pub mod backbone;
pub mod config;
pub mod daily;
pub mod rtvi;

pub use config::TransportConfig;
pub use daily::{DailyTransport, DailyTransportAuthBundle};
pub use rtvi::{Transport, TransportError, TransportState};

use tracing_subscriber::EnvFilter;

// ============================================================================
// LOGGING
// ============================================================================

/// Initialisiert das Logging für die Host-Anwendung
///
/// `RUST_LOG` wird respektiert; zusätzlich loggt dieses Crate auf Debug-Level.
/// Schlägt fehl, wenn bereits ein globaler Subscriber installiert ist.
pub fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("rtvi_daily_transport=debug".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Logging initialized");
    Ok(())
}
