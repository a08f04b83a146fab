//! # raumchat-crypto
//!
//! Ende-zu-Ende Verschluesselung fuer Raumchat.
//!
//! ## Module
//! - `identity` - P-256 Schluessel-Paar pro Prozess
//! - `e2e` - Key Agreement (ECDH + KDF) und Per-Peer AEAD
//! - `types` - Gemeinsame Typen (PublicKey, SessionKey, Nonce, etc.)
//! - `error` - Fehlertypen

pub mod e2e;
pub mod error;
pub mod identity;
pub mod types;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use identity::IdentityKeyPair;
pub use types::{
    EncryptedPayload, Nonce, PublicKey, SecretBytes, SessionKey, NONCE_LAENGE,
    PUBLIC_KEY_LAENGE, SCHLUESSEL_LAENGE, TAG_LAENGE,
};

pub use e2e::{CipherSession, KdfModus, KeyAgreement, PeerKeySlot};
