//! Base64-Kodierung der Binaerfelder
//!
//! Alle Binaerfelder (`pubkey`, `iv`, `ct`) werden als Standard-Base64 mit
//! Padding uebertragen, wie es auch Browser-Clients (`btoa`) erzeugen.

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub use base64::DecodeError;

/// Kodiert Bytes als Base64-String
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Dekodiert einen Base64-String
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD.decode(text.trim())
}
