//! P-256 ECDH Key Agreement
//!
//! Leitet aus dem lokalen privaten Schluessel und dem oeffentlichen
//! Schluessel eines Peers einen AES-256-GCM-Schluessel ab. Die Ableitung ist
//! deterministisch und symmetrisch: beide Seiten erhalten denselben
//! Schluessel, ohne dass er je uebertragen wird.
//!
//! ## Modi
//! ```text
//! HkdfSha256:  key = HKDF-SHA256(ikm = x(shared), salt = -, info = "raumchat-aes256gcm-v1")
//! Roh:         key = x(shared)        (kompatibel zu WebCrypto deriveKey)
//! ```

use std::fmt;
use std::str::FromStr;

use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::identity::IdentityKeyPair;
use crate::types::{PublicKey, SessionKey, SCHLUESSEL_LAENGE};

/// Domain-Separation fuer die HKDF-Ableitung
const HKDF_INFO: &[u8] = b"raumchat-aes256gcm-v1";

/// Verfahren, mit dem aus dem ECDH-Secret der AES-Schluessel wird
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KdfModus {
    /// HKDF-SHA256 ohne Salt (Standard)
    #[default]
    HkdfSha256,
    /// Rohe X-Koordinate als Schluessel
    Roh,
}

impl fmt::Display for KdfModus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HkdfSha256 => write!(f, "hkdf_sha256"),
            Self::Roh => write!(f, "roh"),
        }
    }
}

impl FromStr for KdfModus {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hkdf_sha256" | "hkdf-sha256" | "hkdf" => Ok(Self::HkdfSha256),
            "roh" | "raw" => Ok(Self::Roh),
            andere => Err(CryptoError::KeyDerivation(format!(
                "Unbekannter KDF-Modus: '{}'",
                andere
            ))),
        }
    }
}

/// Key Agreement mit der lokalen Identitaet
#[derive(Debug)]
pub struct KeyAgreement {
    identity: IdentityKeyPair,
    modus: KdfModus,
}

impl KeyAgreement {
    pub fn new(identity: IdentityKeyPair, modus: KdfModus) -> Self {
        Self { identity, modus }
    }

    pub fn identity(&self) -> &IdentityKeyPair {
        &self.identity
    }

    pub fn modus(&self) -> KdfModus {
        self.modus
    }

    /// Leitet den Sitzungsschluessel fuer einen validierten Peer-Schluessel ab
    pub fn derive(&self, peer: &PublicKey) -> CryptoResult<SessionKey> {
        let shared = self.identity.diffie_hellman(peer);
        let x = shared.raw_secret_bytes();

        match self.modus {
            KdfModus::Roh => SessionKey::new(x.to_vec()),
            KdfModus::HkdfSha256 => {
                let hk = Hkdf::<Sha256>::new(None, x.as_slice());
                let mut okm = vec![0u8; SCHLUESSEL_LAENGE];
                hk.expand(HKDF_INFO, &mut okm)
                    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
                SessionKey::new(okm)
            }
        }
    }

    /// Wie [`derive`](Self::derive), validiert aber zuerst untrusted SEC1-Bytes
    pub fn derive_from_bytes(&self, peer_public: &[u8]) -> CryptoResult<SessionKey> {
        let peer = PublicKey::from_sec1_bytes(peer_public)?;
        self.derive(&peer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
