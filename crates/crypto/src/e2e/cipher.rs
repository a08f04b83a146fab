//! Per-Peer AEAD (AES-256-GCM)
//!
//! Verschluesselt Chat-Nachrichten fuer genau einen Peer.
//!
//! ## Format
//! ```text
//! iv = nonce(12, zufaellig pro Aufruf)
//! ct = ciphertext || auth_tag(16)
//! ```
//!
//! Der abgeleitete Schluessel wird im Peer-Eintrag gecacht. Wer den
//! Peer-Schluessel aendert, muss den Cache leeren (siehe [`PeerKeySlot`]).

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use raumchat_core::PeerId;

use crate::e2e::key_agreement::{KdfModus, KeyAgreement};
use crate::error::{CryptoError, CryptoResult};
use crate::identity::IdentityKeyPair;
use crate::types::{EncryptedPayload, Nonce, PublicKey, SessionKey, NONCE_LAENGE};

/// Sicht der CipherSession auf einen Peer-Eintrag
///
/// Der Eintrag besitzt den gecachten Schluessel; die CipherSession fuellt
/// den Cache nur, wenn er leer ist.
pub trait PeerKeySlot {
    fn peer_id(&self) -> &PeerId;
    fn public_key(&self) -> Option<&PublicKey>;
    fn session_key_cache(&mut self) -> &mut Option<SessionKey>;
}

/// Verschluesselung/Entschluesselung fuer einzelne Peers
#[derive(Debug)]
pub struct CipherSession {
    agreement: KeyAgreement,
}

impl CipherSession {
    pub fn new(identity: IdentityKeyPair, modus: KdfModus) -> Self {
        Self {
            agreement: KeyAgreement::new(identity, modus),
        }
    }

    pub fn identity(&self) -> &IdentityKeyPair {
        self.agreement.identity()
    }

    pub fn modus(&self) -> KdfModus {
        self.agreement.modus()
    }

    /// Verschluesselt `plaintext` fuer den Peer mit frischer Nonce
    pub fn encrypt<P: PeerKeySlot>(
        &self,
        peer: &mut P,
        plaintext: &[u8],
    ) -> CryptoResult<EncryptedPayload> {
        let key = self.schluessel_fuer(peer)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

        let mut bytes = [0u8; NONCE_LAENGE];
        OsRng.fill_bytes(&mut bytes);
        let nonce = Nonce { bytes };

        let ciphertext = cipher
            .encrypt(AesNonce::from_slice(nonce.as_bytes()), plaintext)
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

        Ok(EncryptedPayload { nonce, ciphertext })
    }

    /// Entschluesselt einen Ciphertext des Peers
    ///
    /// `Authentifizierung` ist bei Broadcasts das normale Ergebnis fuer alle
    /// Empfaenger ausser dem beabsichtigten.
    pub fn decrypt<P: PeerKeySlot>(
        &self,
        peer: &mut P,
        nonce: &[u8],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let key = self.schluessel_fuer(peer)?;
        let nonce = Nonce::from_slice(nonce)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

        cipher
            .decrypt(AesNonce::from_slice(nonce.as_bytes()), ciphertext)
            .map_err(|_| CryptoError::Authentifizierung)
    }

    /// Gecachter Schluessel oder frische Ableitung (wird dann gecacht)
    fn schluessel_fuer<P: PeerKeySlot>(&self, peer: &mut P) -> CryptoResult<SessionKey> {
        if let Some(key) = peer.session_key_cache().as_ref() {
            return Ok(key.clone());
        }

        let public = peer
            .public_key()
            .ok_or_else(|| CryptoError::KeinPeerSchluessel {
                peer_id: peer.peer_id().to_string(),
            })?;
        let key = self.agreement.derive(public)?;

        tracing::trace!(peer_id = %peer.peer_id(), "Sitzungsschluessel abgeleitet");
        *peer.session_key_cache() = Some(key.clone());
        Ok(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
