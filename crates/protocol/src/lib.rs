//! raumchat-protocol – Relay-Protokoll-Definitionen
//!
//! Dieses Crate definiert alle JSON-Nachrichten, die zwischen Client und
//! Relay ausgetauscht werden, sowie die Base64-Kodierung der Binaerfelder.

pub mod encoding;
pub mod relay;

pub use relay::{ClientMessage, DirectCiphertext, InboundCiphertext, RosterEntry, ServerMessage};
