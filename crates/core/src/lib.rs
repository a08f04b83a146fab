//! raumchat-core – Gemeinsame Typen, Events und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die Protokoll, Session und
//! Client gemeinsam nutzen: Peer-IDs, die Chat-Log-Eintraege und die
//! Session-Events fuer die UI-Grenze.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{RaumchatError, Result};
pub use event::{ChatLogEntry, PeerStatus, SessionEvent, SessionZustand, Warnung, WarnungsArt};
pub use types::PeerId;
