//! RTVI Module - Vertrag zwischen Client und Transport
//!
//! Dieses Modul definiert, was der RTVI Client von einem Transport erwartet:
//! - Transport-Trait und Verbindungsstatus
//! - Callback-Set für Status-, Teilnehmer-, Track- und Geräte-Events
//! - Message-Envelope mit reserviertem `rtvi-ai` Label
//!

mod callbacks;
mod error;
mod messages;
mod transport;

pub use callbacks::{EventCallbacks, NoopCallbacks, TransportCallbacks, TransportEvent};
pub use error::TransportError;
pub use messages::*;
pub use transport::{
    BotTracks, LocalTracks, MessageHandler, Participant, RtviClientOptions, Tracks, Transport,
    TransportState,
};
