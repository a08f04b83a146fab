//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey as P256PublicKey;

use crate::error::{CryptoError, CryptoResult};

/// Laenge einer AES-GCM-Nonce in Bytes (96 Bit)
pub const NONCE_LAENGE: usize = 12;

/// Laenge des symmetrischen Schluessels in Bytes (AES-256)
pub const SCHLUESSEL_LAENGE: usize = 32;

/// Laenge des AEAD-Auth-Tags in Bytes
pub const TAG_LAENGE: usize = 16;

/// Laenge eines unkomprimierten SEC1-Punkts auf P-256 (0x04 || X || Y)
pub const PUBLIC_KEY_LAENGE: usize = 65;

/// Validierter oeffentlicher P-256-Schluessel
///
/// Kann nur ueber [`PublicKey::from_sec1_bytes`] oder aus einer lokalen
/// Identitaet entstehen; ein Wert dieses Typs liegt immer auf der Kurve.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: P256PublicKey,
    encoded: Vec<u8>,
}

impl PublicKey {
    /// Parst und validiert einen unkomprimierten SEC1-Punkt
    ///
    /// Prueft Format-Byte, Laenge und Kurvenzugehoerigkeit. Der
    /// Identitaetspunkt wird abgelehnt.
    pub fn from_sec1_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != PUBLIC_KEY_LAENGE || bytes[0] != 0x04 {
            return Err(CryptoError::KeyAgreement(format!(
                "kein unkomprimierter P-256-Punkt ({} Bytes)",
                bytes.len()
            )));
        }
        let inner = P256PublicKey::from_sec1_bytes(bytes).map_err(|_| {
            CryptoError::KeyAgreement("Punkt liegt nicht auf P-256".to_string())
        })?;
        Ok(Self::from_p256(inner))
    }

    pub(crate) fn from_p256(inner: P256PublicKey) -> Self {
        let encoded = inner.to_encoded_point(false).as_bytes().to_vec();
        Self { inner, encoded }
    }

    pub(crate) fn as_p256(&self) -> &P256PublicKey {
        &self.inner
    }

    /// Unkomprimierte SEC1-Kodierung (65 Bytes)
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Die ersten Bytes der X-Koordinate reichen zur Unterscheidung in Logs
        write!(f, "PublicKey(P-256 {:02x?}..)", &self.encoded[1..5])
    }
}

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Abgeleiteter symmetrischer Schluessel fuer genau einen Peer (AES-256-GCM)
#[derive(Clone, Debug)]
pub struct SessionKey(SecretBytes);

impl SessionKey {
    pub(crate) fn new(bytes: Vec<u8>) -> CryptoResult<Self> {
        if bytes.len() != SCHLUESSEL_LAENGE {
            return Err(CryptoError::KeyDerivation(format!(
                "Schluessel hat {} statt {} Bytes",
                bytes.len(),
                SCHLUESSEL_LAENGE
            )));
        }
        Ok(Self(SecretBytes::new(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Eine kryptografische Nonce (Number used once)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce {
    pub bytes: [u8; NONCE_LAENGE],
}

impl Nonce {
    /// Uebernimmt eine Nonce aus untrusted Bytes (Laenge wird geprueft)
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; NONCE_LAENGE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::UngueltigeNonce {
                    erwartet: NONCE_LAENGE,
                    erhalten: bytes.len(),
                })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LAENGE] {
        &self.bytes
    }
}

/// Verschluesselter Payload (Nonce + Ciphertext inkl. Auth-Tag)
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    /// 12 Bytes Nonce, frisch pro Verschluesselung
    pub nonce: Nonce,
    /// Verschluesselter Inhalt inkl. 16 Bytes Auth-Tag (angehaengt)
    pub ciphertext: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityKeyPair;

    #[test]
    fn nonce_mit_falscher_laenge_abgelehnt() {
        assert!(matches!(
            Nonce::from_slice(&[0u8; 8]),
            Err(CryptoError::UngueltigeNonce {
                erwartet: 12,
                erhalten: 8
            })
        ));
        assert!(Nonce::from_slice(&[7u8; 12]).is_ok());
    }

    #[test]
    fn public_key_roundtrip_ueber_sec1() {
        let identity = IdentityKeyPair::generate();
        let bytes = identity.export_public();
        let parsed = PublicKey::from_sec1_bytes(&bytes).unwrap();
        assert_eq!(parsed.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn komprimierter_punkt_abgelehnt() {
        let identity = IdentityKeyPair::generate();
        let compressed = identity
            .public_key()
            .as_p256()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        assert_eq!(compressed.len(), 33);
        assert!(matches!(
            PublicKey::from_sec1_bytes(&compressed),
            Err(CryptoError::KeyAgreement(_))
        ));
    }

    #[test]
    fn punkt_ausserhalb_der_kurve_abgelehnt() {
        let identity = IdentityKeyPair::generate();
        let mut bytes = identity.export_public();
        // Y-Koordinate veraendern: Laenge und Format bleiben gueltig
        bytes[64] ^= 0x01;
        assert!(matches!(
            PublicKey::from_sec1_bytes(&bytes),
            Err(CryptoError::KeyAgreement(_))
        ));
    }

    #[test]
    fn nullpunkt_abgelehnt() {
        let mut bytes = vec![0u8; PUBLIC_KEY_LAENGE];
        bytes[0] = 0x04;
        assert!(PublicKey::from_sec1_bytes(&bytes).is_err());
    }

    #[test]
    fn secret_debug_ist_redacted() {
        let s = SecretBytes::new(vec![1, 2, 3]);
        let dbg = format!("{:?}", s);
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("1, 2, 3"));
    }

    #[test]
    fn session_key_laenge_geprueft() {
        assert!(SessionKey::new(vec![0u8; 16]).is_err());
        assert!(SessionKey::new(vec![0u8; 32]).is_ok());
    }
}
