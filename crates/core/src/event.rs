//! Session-Events fuer die UI-Grenze
//!
//! Der SessionController veroeffentlicht diese Events ueber einen
//! tokio-Broadcast-Kanal. Die UI (hier: das Terminal des Clients)
//! entscheidet selbst, was sie davon anzeigt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::PeerId;

/// Zustand einer Raum-Session
///
/// ```text
/// Getrennt -> Verbindend -> Beigetreten -> Aktiv
///     ^                                      |
///     +------------- Transport zu -----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionZustand {
    /// Keine Verbindung zum Relay
    Getrennt,
    /// `join` gesendet, Roster steht noch aus
    Verbindend,
    /// Roster empfangen, eigener Schluessel wird angekuendigt
    Beigetreten,
    /// Normalbetrieb
    Aktiv,
}

impl std::fmt::Display for SessionZustand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionZustand::Getrennt => write!(f, "getrennt"),
            SessionZustand::Verbindend => write!(f, "verbindend"),
            SessionZustand::Beigetreten => write!(f, "beigetreten"),
            SessionZustand::Aktiv => write!(f, "aktiv"),
        }
    }
}

/// Schluessel-Status eines einzelnen Peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerStatus {
    /// Peer bekannt, oeffentlicher Schluessel noch nicht angekuendigt
    KeyUnknown,
    /// Oeffentlicher Schluessel liegt vor, Verschluesselung moeglich
    KeyKnown,
}

/// Ein Eintrag im Chat-Log (append-only, wird nie veraendert)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    /// Lokal vergebene, streng monotone Einfuegereihenfolge
    pub seq: u64,
    /// Absender
    pub from: PeerId,
    /// Anzeigename zum Zeitpunkt des Empfangs
    pub username: String,
    /// Klartext
    pub text: String,
    /// true fuer das lokale Echo eigener Nachrichten
    pub eigene: bool,
    /// Lokaler Empfangszeitpunkt
    pub empfangen_am: DateTime<Utc>,
}

/// Art einer nicht-fatalen Warnung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnungsArt {
    /// Nachricht von einer Peer-ID ohne Verzeichnis-Eintrag
    UnbekannterAbsender,
    /// Peer hat (noch) keinen oeffentlichen Schluessel
    KeinSchluessel,
    /// AEAD-Tag stimmt nicht
    Authentifizierung,
    /// Angekuendigter Schluessel ist kein gueltiger P-256-Punkt
    UngueltigerSchluessel,
    /// Nachricht war syntaktisch unbrauchbar (Base64, Nonce-Laenge, UTF-8)
    UngueltigeNachricht,
    /// `peer-joined` fuer eine bereits bekannte ID
    DoppelterBeitritt,
    /// Verschluesselung fuer einen Peer beim Senden fehlgeschlagen
    SendenFehlgeschlagen,
}

/// Nicht-fatale Warnung an die UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warnung {
    pub art: WarnungsArt,
    pub peer_id: Option<PeerId>,
    pub details: String,
}

impl Warnung {
    /// Erstellt eine Warnung fuer einen bestimmten Peer
    pub fn fuer_peer(art: WarnungsArt, peer_id: &PeerId, details: impl Into<String>) -> Self {
        Self {
            art,
            peer_id: Some(peer_id.clone()),
            details: details.into(),
        }
    }
}

impl std::fmt::Display for Warnung {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.peer_id {
            Some(id) => write!(f, "{:?} (peer {}): {}", self.art, id, self.details),
            None => write!(f, "{:?}: {}", self.art, self.details),
        }
    }
}

/// Alle Events, die eine Session an die UI meldet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Neuer Chat-Log-Eintrag (empfangen oder lokales Echo)
    ChatEintrag(ChatLogEntry),
    /// Nicht-fatale Warnung
    Warnung(Warnung),
    /// Session-Zustand hat sich geaendert
    ZustandGeaendert {
        von: SessionZustand,
        nach: SessionZustand,
    },
    /// Peer wurde hinzugefuegt oder hat einen Schluessel erhalten
    PeerAktualisiert {
        peer_id: PeerId,
        username: String,
        status: PeerStatus,
    },
    /// Peer hat den Raum verlassen
    PeerEntfernt { peer_id: PeerId },
}
