//! Peer-Verzeichnis – Wer ist im Raum, wessen Schluessel ist bekannt?
//!
//! Das Verzeichnis ist die einzige Stelle, an der Peer-Zustand lebt. Jeder
//! Eintrag besitzt seinen abgeleiteten Sitzungsschluessel; kein anderer
//! Teil der Session cacht ihn.
//!
//! ## Lebenszyklus eines Eintrags
//! ```text
//!   roster / peer-joined          peer-pubkey
//! ------------------------> KeyUnknown ----------> KeyKnown
//!                               |                      |
//!                               +------ peer-left -----+--> (entfernt, Cache verworfen)
//! ```
//!
//! Es gibt keine Nebenlaeufigkeit: der SessionController verarbeitet ein
//! Event nach dem anderen und haelt das Verzeichnis exklusiv.

use std::collections::BTreeMap;

use raumchat_core::{PeerId, PeerStatus};
use raumchat_crypto::{PeerKeySlot, PublicKey, SessionKey};

// ---------------------------------------------------------------------------
// PeerRecord
// ---------------------------------------------------------------------------

/// Ein Peer im Raum, inkl. gecachtem Sitzungsschluessel
#[derive(Debug)]
pub struct PeerRecord {
    id: PeerId,
    username: String,
    public_key: Option<PublicKey>,
    session_key: Option<SessionKey>,
}

impl PeerRecord {
    fn neu(id: PeerId, username: String) -> Self {
        Self {
            id,
            username,
            public_key: None,
            session_key: None,
        }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn status(&self) -> PeerStatus {
        if self.public_key.is_some() {
            PeerStatus::KeyKnown
        } else {
            PeerStatus::KeyUnknown
        }
    }

    /// true, wenn bereits ein abgeleiteter Schluessel gecacht ist
    pub fn hat_sitzungsschluessel(&self) -> bool {
        self.session_key.is_some()
    }

    fn schluessel_setzen(&mut self, key: PublicKey) {
        self.public_key = Some(key);
        // Neuer Peer-Schluessel: alter abgeleiteter Schluessel ist ungueltig
        self.session_key = None;
    }

    fn snapshot(&self) -> PeerSnapshot {
        PeerSnapshot {
            id: self.id.clone(),
            username: self.username.clone(),
            public_key: self.public_key.clone(),
            status: self.status(),
        }
    }
}

impl PeerKeySlot for PeerRecord {
    fn peer_id(&self) -> &PeerId {
        &self.id
    }

    fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    fn session_key_cache(&mut self) -> &mut Option<SessionKey> {
        &mut self.session_key
    }
}

/// Unveraenderliche Kopie eines Eintrags (ohne Sitzungsschluessel)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSnapshot {
    pub id: PeerId,
    pub username: String,
    pub public_key: Option<PublicKey>,
    pub status: PeerStatus,
}

/// Bereits validierter Roster-Eintrag
#[derive(Debug, Clone)]
pub struct RosterPeer {
    pub id: PeerId,
    pub username: String,
    pub public_key: Option<PublicKey>,
}

// ---------------------------------------------------------------------------
// PeerDirectory
// ---------------------------------------------------------------------------

/// Zuordnung Peer-ID -> PeerRecord
#[derive(Debug, Default)]
pub struct PeerDirectory {
    peers: BTreeMap<PeerId, PeerRecord>,
}

impl PeerDirectory {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Uebernimmt den initialen Roster
    ///
    /// Bereits vorhandene Eintraege behalten Namen und Schluessel; der
    /// Roster ergaenzt nur, was noch fehlt.
    pub fn upsert_roster(&mut self, entries: impl IntoIterator<Item = RosterPeer>) {
        for entry in entries {
            let record = self
                .peers
                .entry(entry.id.clone())
                .or_insert_with(|| PeerRecord::neu(entry.id, String::new()));

            if record.username.is_empty() {
                record.username = entry.username;
            }
            if record.public_key.is_none() {
                if let Some(key) = entry.public_key {
                    record.schluessel_setzen(key);
                }
            }
        }
        tracing::debug!(anzahl = self.peers.len(), "Roster uebernommen");
    }

    /// Fuegt einen neu beigetretenen Peer hinzu
    ///
    /// Kam der Schluessel vor dem Beitritt, erhaelt der namenlose Eintrag
    /// hier seinen Namen und behaelt den Schluessel. Gibt `false` zurueck
    /// (und aendert nichts), wenn die ID bereits mit Namen bekannt ist.
    pub fn add_peer(&mut self, id: PeerId, username: impl Into<String>) -> bool {
        if let Some(record) = self.peers.get_mut(&id) {
            if record.username.is_empty() {
                record.username = username.into();
                tracing::debug!(
                    peer_id = %id,
                    username = %record.username,
                    "Beitritt nach Schluessel, Name ergaenzt"
                );
                return true;
            }
            tracing::warn!(peer_id = %id, "Doppelter Beitritt ignoriert");
            return false;
        }
        let record = PeerRecord::neu(id.clone(), username.into());
        tracing::debug!(peer_id = %id, username = %record.username, "Peer beigetreten");
        self.peers.insert(id, record);
        true
    }

    /// Setzt den oeffentlichen Schluessel eines Peers
    ///
    /// Legt den Eintrag an, falls die Ankuendigung vor dem Beitritt kommt.
    /// Ein gecachter Sitzungsschluessel wird in jedem Fall verworfen.
    pub fn set_public_key(&mut self, id: &PeerId, key: PublicKey) {
        let record = self.peers.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(peer_id = %id, "Schluessel vor Beitritt, Eintrag angelegt");
            PeerRecord::neu(id.clone(), String::new())
        });
        record.schluessel_setzen(key);
    }

    /// Entfernt einen Peer samt gecachtem Schluessel (idempotent)
    pub fn remove_peer(&mut self, id: &PeerId) -> Option<PeerSnapshot> {
        let entfernt = self.peers.remove(id).map(|r| r.snapshot());
        if entfernt.is_some() {
            tracing::debug!(peer_id = %id, "Peer entfernt");
        }
        entfernt
    }

    pub fn get(&self, id: &PeerId) -> Option<PeerSnapshot> {
        self.peers.get(id).map(PeerRecord::snapshot)
    }

    /// Momentaufnahme aller Eintraege
    ///
    /// Der Iterator haelt keine Referenz auf das Verzeichnis; der Aufrufer
    /// darf waehrenddessen weitere Aenderungen vornehmen.
    pub fn list(&self) -> impl Iterator<Item = PeerSnapshot> {
        self.peers
            .values()
            .map(PeerRecord::snapshot)
            .collect::<Vec<_>>()
            .into_iter()
    }

    pub fn status(&self, id: &PeerId) -> Option<PeerStatus> {
        self.peers.get(id).map(PeerRecord::status)
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.peers.contains_key(id)
    }

    pub(crate) fn record_mut(&mut self, id: &PeerId) -> Option<&mut PeerRecord> {
        self.peers.get_mut(id)
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut PeerRecord> {
        self.peers.values_mut()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Verwirft alle Eintraege (Verbindungsende)
    pub fn clear(&mut self) {
        self.peers.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
