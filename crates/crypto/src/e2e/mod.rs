//! E2E Verschluesselung (End-to-End)
//!
//! Client <-> Client Verschluesselung. Das Relay forwardet Ciphertexte
//! blind und kann den Chat-Inhalt nicht entschluesseln.
//!
//! ## Ablauf
//! 1. Jeder Client erzeugt beim Start eine `IdentityKeyPair` (P-256)
//! 2. Nach dem Beitritt kuendigt er seinen oeffentlichen Schluessel an
//! 3. Pro Peer: ECDH + KDF ergibt einen eigenen AES-256-GCM-Schluessel
//! 4. Jede Nachricht wird pro Peer mit frischer Nonce verschluesselt

pub mod cipher;
pub mod key_agreement;

pub use cipher::{CipherSession, PeerKeySlot};
pub use key_agreement::{KdfModus, KeyAgreement};
