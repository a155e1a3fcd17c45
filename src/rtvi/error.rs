//! Fehlertypen des Transports

use crate::backbone::BackboneError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport instance not initialized")]
    NotInitialized,

    /// Join (oder Raum-Abfrage) fehlgeschlagen
    #[error("Failed to start transport: {0}")]
    StartFailure(String),

    #[error("Backbone error: {0}")]
    Backbone(#[from] BackboneError),

    #[error("Failed to encode message: {0}")]
    MessageEncoding(String),

    /// Session endete, bevor der Bot bereit war
    #[error("Session ended before the ready handshake")]
    SessionEnded,

    /// Nicht alle Teardown-Schritte waren erfolgreich
    #[error("Teardown incomplete, {} step(s) failed", .0.len())]
    Teardown(Vec<BackboneError>),
}
