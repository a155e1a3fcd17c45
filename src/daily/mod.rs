//! Daily Module - RTVI Transport über ein Daily Call-Objekt
//!
//! Dieses Modul verwaltet:
//! - Lifecycle des Call-Objekts (initialize, connect, disconnect)
//! - Übersetzung der Backbone-Events in RTVI-Callbacks
//! - Ready-Handshake und App-Messages über den Data-Channel
//! - Geräte-Auswahl und lokale Medien
//!

mod dispatch;
mod transport;


pub use transport::{DailyTransport, DailyTransportAuthBundle};
