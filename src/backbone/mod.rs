//! Backbone Module - Schnittstelle zum Daily Call-Objekt
//!
//! Dieses Modul beschreibt, was der Transport vom Call-Backbone erwartet:
//! - Session-Lifecycle (join, leave, destroy)
//! - Geräte-Auflistung und -Auswahl
//! - Lokale Medien, Screen-Share und Audio-Level Observer
//! - Data-Channel für App-Messages
//! - Event-Stream des Call-Objekts
//!

mod call;
mod events;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use call::{BackboneError, CallBackbone, CallFactory};
pub use events::{BackboneEvent, NonFatalErrorKind, TrackEvent};
pub use types::*;
