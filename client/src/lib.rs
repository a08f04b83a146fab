//! raumchat-client – Terminal-Client
//!
//! Stellt Konfiguration, Logging, die WebSocket-Verbindung zum Relay und
//! den Event-Loop einer Sitzung bereit. `main.rs` verdrahtet nur noch.

pub mod config;
pub mod connection;
pub mod logging;
pub mod sitzung;

pub use config::ClientConfig;
pub use connection::RelayConnection;
pub use sitzung::{sitzung_ausfuehren, sitzung_fuehren};
