//! Fehlertypen fuer raumchat
//!
//! Zentraler Fehler-Enum fuer Transport und Konfiguration. Krypto- und
//! Session-Crates definieren eigene Fehler (`CryptoError`, `SessionError`).

use thiserror::Error;

/// Globaler Result-Alias fuer raumchat
pub type Result<T> = std::result::Result<T, RaumchatError>;

/// Fehler an der Transport- und Prozessgrenze
#[derive(Debug, Error)]
pub enum RaumchatError {
    // --- Verbindung & Netzwerk ---
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl RaumchatError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn ein erneuter Verbindungsaufbau sinnvoll waere
    ///
    /// Der Client wiederholt nie automatisch; das Flag dient nur der Anzeige.
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(self, Self::Verbindung(_) | Self::Getrennt(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = RaumchatError::Verbindung("connection refused".into());
        assert_eq!(e.to_string(), "Verbindung fehlgeschlagen: connection refused");
    }

    #[test]
    fn wiederholbar_erkennung() {
        assert!(RaumchatError::Getrennt("close frame".into()).ist_wiederholbar());
        assert!(!RaumchatError::Konfiguration("leerer Raum".into()).ist_wiederholbar());
        assert!(!RaumchatError::intern("x").ist_wiederholbar());
    }
}
