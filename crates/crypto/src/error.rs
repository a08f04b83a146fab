//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Oeffentlicher Schluessel des Peers ist kein gueltiger P-256-Punkt
    #[error("Key-Agreement fehlgeschlagen: {0}")]
    KeyAgreement(String),

    /// Fuer den Peer liegt (noch) kein oeffentlicher Schluessel vor
    #[error("Kein oeffentlicher Schluessel fuer Peer {peer_id}")]
    KeinPeerSchluessel { peer_id: String },

    /// AEAD-Tag stimmt nicht (falscher Schluessel oder manipulierte Daten)
    #[error("Authentifizierung fehlgeschlagen: Auth-Tag stimmt nicht")]
    Authentifizierung,

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),

    #[error("Ungueltige Nonce-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeNonce { erwartet: usize, erhalten: usize },
}

impl CryptoError {
    /// true fuer Fehler, die im Broadcast-Betrieb normal sind
    ///
    /// Jeder Broadcast-Empfaenger versucht die Entschluesselung; nur der
    /// beabsichtigte Empfaenger hat den passenden Schluessel.
    pub fn ist_routine(&self) -> bool {
        matches!(
            self,
            Self::Authentifizierung | Self::KeinPeerSchluessel { .. }
        )
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routine_fehler_erkennung() {
        assert!(CryptoError::Authentifizierung.ist_routine());
        assert!(CryptoError::KeinPeerSchluessel {
            peer_id: "2".into()
        }
        .ist_routine());
        assert!(!CryptoError::KeyAgreement("kaputt".into()).ist_routine());
        assert!(!CryptoError::UngueltigeNonce {
            erwartet: 12,
            erhalten: 8
        }
        .ist_routine());
    }

    #[test]
    fn nonce_fehler_anzeige() {
        let e = CryptoError::UngueltigeNonce {
            erwartet: 12,
            erhalten: 8,
        };
        assert!(e.to_string().contains("erwartet 12"));
        assert!(e.to_string().contains("erhalten 8"));
    }
}
