//! # raumchat-session
//!
//! Peer-Verzeichnis und Session-Controller: setzt Relay-Events in
//! Verzeichnis-Aenderungen und Chat-Log-Eintraege um und erzeugt aus
//! Klartext die Chiffrat-Nachrichten an das Relay.
//!
//! ## Module
//! - `directory` - Peer-Verzeichnis mit gecachten Sitzungsschluesseln
//! - `controller` - Zustandsmaschine und Event-Verarbeitung
//! - `error` - Fehlertypen

pub mod controller;
pub mod directory;
pub mod error;

pub use controller::{PeerSendeErgebnis, SendeBericht, SessionController};
pub use directory::{PeerDirectory, PeerRecord, PeerSnapshot, RosterPeer};
pub use error::{SessionError, SessionResult};
