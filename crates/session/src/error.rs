//! Fehlertypen fuer die Raum-Session

use raumchat_core::SessionZustand;
use raumchat_crypto::CryptoError;
use raumchat_protocol::encoding::DecodeError;
use thiserror::Error;

/// Fehlertyp fuer die Raum-Session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Operation im aktuellen Zustand nicht erlaubt
    #[error("Operation im Zustand '{zustand}' nicht moeglich")]
    FalscherZustand { zustand: SessionZustand },

    /// Kryptografie-Fehler (Key Agreement, AEAD)
    #[error("Krypto-Fehler: {0}")]
    Krypto(#[from] CryptoError),

    /// Binaerfeld war kein gueltiges Base64
    #[error("Base64-Fehler: {0}")]
    Base64(#[from] DecodeError),

    /// Entschluesselter Klartext ist kein UTF-8
    #[error("Klartext ist kein gueltiges UTF-8")]
    KeinUtf8,
}

impl SessionError {
    /// true fuer Krypto-Fehler, die bei Broadcast-Nicht-Empfaengern normal sind
    pub fn ist_routine(&self) -> bool {
        matches!(self, Self::Krypto(e) if e.ist_routine())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
