//! Lokale Identitaet (P-256 Schluessel-Paar)
//!
//! Jeder Client erzeugt beim Start ein P-256-Schluessel-Paar. Der
//! oeffentliche Schluessel wird ueber das Relay angekuendigt, der private
//! Schluessel verlaesst diesen Typ nie. Es gibt keine Persistenz: ein
//! neuer Prozess ist eine neue Identitaet.

use p256::ecdh::{diffie_hellman, SharedSecret};
use p256::SecretKey;
use rand::rngs::OsRng;

use crate::types::PublicKey;

/// Lokales Schluessel-Paar fuer ECDH
pub struct IdentityKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl IdentityKeyPair {
    /// Generiert ein neues P-256-Schluessel-Paar
    ///
    /// Panikt nur, wenn das Betriebssystem keine Zufallszahlen liefert.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let public = PublicKey::from_p256(secret.public_key());
        Self { secret, public }
    }

    /// Oeffentlicher Schluessel als unkomprimierter SEC1-Punkt (65 Bytes)
    pub fn export_public(&self) -> Vec<u8> {
        self.public.as_bytes().to_vec()
    }

    /// Oeffentlicher Schluessel als validierter Typ
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// ECDH mit einem (bereits validierten) Peer-Schluessel
    pub(crate) fn diffie_hellman(&self, peer: &PublicKey) -> SharedSecret {
        diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_p256().as_affine())
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityKeyPair {{ public_key: {:?} }}", self.public)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PUBLIC_KEY_LAENGE;

    #[test]
    fn identity_generieren() {
        let identity = IdentityKeyPair::generate();
        let pub_bytes = identity.export_public();
        assert_eq!(pub_bytes.len(), PUBLIC_KEY_LAENGE);
        assert_eq!(pub_bytes[0], 0x04);
    }

    #[test]
    fn export_ist_deterministisch() {
        let identity = IdentityKeyPair::generate();
        assert_eq!(identity.export_public(), identity.export_public());
    }

    #[test]
    fn verschiedene_identitaeten_verschiedene_keys() {
        let a = IdentityKeyPair::generate();
        let b = IdentityKeyPair::generate();
        assert_ne!(a.export_public(), b.export_public());
    }

    #[test]
    fn debug_zeigt_keinen_privaten_schluessel() {
        let identity = IdentityKeyPair::generate();
        let dbg = format!("{:?}", identity);
        assert!(dbg.starts_with("IdentityKeyPair"));
        assert!(!dbg.contains("secret"));
    }
}
