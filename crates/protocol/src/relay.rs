//! Relay-Protokoll (JSON ueber WebSocket)
//!
//! Definiert alle Nachrichten zwischen Client und Relay.
//!
//! ## Design
//! - Jede Nachricht ist ein JSON-Objekt mit `type`-Feld
//! - Tagged Enums: unbekannte Typen scheitern beim Parsen statt still
//!   ignoriert zu werden
//! - Binaerfelder (`pubkey`, `iv`, `ct`) sind Base64-Strings, siehe
//!   [`crate::encoding`]
//! - Keine Sequenznummern, keine Bestaetigungen

use raumchat_core::PeerId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Gemeinsame Bausteine
// ---------------------------------------------------------------------------

/// Eintrag im initialen Roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PeerId,
    #[serde(default)]
    pub username: String,
    /// Oeffentlicher Schluessel (Base64), falls bereits angekuendigt
    #[serde(default)]
    pub pubkey: Option<String>,
}

/// Gerichtete Chiffrat-Nachricht (Client -> Relay)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectCiphertext {
    /// Empfaenger
    pub to: PeerId,
    /// 12-Byte Nonce, Base64
    pub iv: String,
    /// Chiffrat inkl. 16-Byte Auth-Tag, Base64
    pub ct: String,
}

/// Eingehende Chiffrat-Nachricht (Relay -> Client)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundCiphertext {
    /// Absender laut Relay
    pub from: PeerId,
    pub iv: String,
    pub ct: String,
}

// ---------------------------------------------------------------------------
// Client -> Relay
// ---------------------------------------------------------------------------

/// Alle Nachrichten, die der Client an das Relay sendet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Raum betreten
    Join { room: String, username: String },
    /// Eigenen oeffentlichen Schluessel ankuendigen
    AnnouncePubkey { pubkey: String },
    /// Chiffrat an genau einen Peer
    EncrMessage(DirectCiphertext),
}

impl ClientMessage {
    /// Erstellt eine `join`-Nachricht
    pub fn join(room: impl Into<String>, username: impl Into<String>) -> Self {
        Self::Join {
            room: room.into(),
            username: username.into(),
        }
    }

    /// Name des `type`-Felds (fuer Logs)
    pub fn typ(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::AnnouncePubkey { .. } => "announce-pubkey",
            ClientMessage::EncrMessage(_) => "encr-message",
        }
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Relay -> Client
// ---------------------------------------------------------------------------

/// Alle Nachrichten, die das Relay an den Client sendet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Initialer Roster, einmal pro Verbindung
    Peers { you: PeerId, peers: Vec<RosterEntry> },
    /// Neuer Peer im Raum
    PeerJoined {
        id: PeerId,
        #[serde(default)]
        username: String,
    },
    /// Peer hat seinen oeffentlichen Schluessel angekuendigt
    PeerPubkey { id: PeerId, pubkey: String },
    /// Peer hat den Raum verlassen
    PeerLeft { id: PeerId },
    /// Gerichtetes Chiffrat an uns
    EncrMessage(InboundCiphertext),
    /// Chiffrat an alle; nur der beabsichtigte Empfaenger kann es oeffnen
    BroadcastEncrMessage(InboundCiphertext),
}

impl ServerMessage {
    /// Name des `type`-Felds (fuer Logs)
    pub fn typ(&self) -> &'static str {
        match self {
            ServerMessage::Peers { .. } => "peers",
            ServerMessage::PeerJoined { .. } => "peer-joined",
            ServerMessage::PeerPubkey { .. } => "peer-pubkey",
            ServerMessage::PeerLeft { .. } => "peer-left",
            ServerMessage::EncrMessage(_) => "encr-message",
            ServerMessage::BroadcastEncrMessage(_) => "broadcast-encr-message",
        }
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn als_value(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn join_wire_format() {
        let msg = ClientMessage::join("test-room", "alice");
        let v = als_value(&msg.to_json().unwrap());
        assert_eq!(
            v,
            json!({"type": "join", "room": "test-room", "username": "alice"})
        );
    }

    #[test]
    fn announce_pubkey_wire_format() {
        let msg = ClientMessage::AnnouncePubkey {
            pubkey: "BAAA".into(),
        };
        let v = als_value(&msg.to_json().unwrap());
        assert_eq!(v, json!({"type": "announce-pubkey", "pubkey": "BAAA"}));
    }

    #[test]
    fn encr_message_ausgehend_ist_flach() {
        let msg = ClientMessage::EncrMessage(DirectCiphertext {
            to: PeerId::from("2"),
            iv: "aXY=".into(),
            ct: "Y3Q=".into(),
        });
        let v = als_value(&msg.to_json().unwrap());
        assert_eq!(
            v,
            json!({"type": "encr-message", "to": "2", "iv": "aXY=", "ct": "Y3Q="})
        );
        assert_eq!(msg.typ(), "encr-message");
    }

    #[test]
    fn peers_mit_null_pubkey_parsen() {
        let json = r#"{"type":"peers","you":"1","peers":[{"id":"2","username":"bob","pubkey":null}]}"#;
        let msg = ServerMessage::from_json(json).unwrap();
        match msg {
            ServerMessage::Peers { you, peers } => {
                assert_eq!(you, PeerId::from("1"));
                assert_eq!(peers.len(), 1);
                assert_eq!(peers[0].username, "bob");
                assert!(peers[0].pubkey.is_none());
            }
            other => panic!("Erwartet Peers, erhalten {:?}", other),
        }
    }

    #[test]
    fn peers_ohne_pubkey_feld_parsen() {
        let json = r#"{"type":"peers","you":"1","peers":[{"id":"3","username":"carol"}]}"#;
        let msg = ServerMessage::from_json(json).unwrap();
        assert!(matches!(msg, ServerMessage::Peers { ref peers, .. } if peers[0].pubkey.is_none()));
    }

    #[test]
    fn broadcast_encr_message_parsen() {
        let json = r#"{"type":"broadcast-encr-message","from":"5","iv":"aXY=","ct":"Y3Q="}"#;
        let msg = ServerMessage::from_json(json).unwrap();
        assert_eq!(msg.typ(), "broadcast-encr-message");
        if let ServerMessage::BroadcastEncrMessage(c) = msg {
            assert_eq!(c.from, PeerId::from("5"));
            assert_eq!(c.iv, "aXY=");
        } else {
            panic!("Erwartet BroadcastEncrMessage");
        }
    }

    #[test]
    fn peer_events_parsen() {
        let joined = ServerMessage::from_json(r#"{"type":"peer-joined","id":"9","username":"dave"}"#).unwrap();
        assert!(matches!(joined, ServerMessage::PeerJoined { ref username, .. } if username == "dave"));

        let pubkey = ServerMessage::from_json(r#"{"type":"peer-pubkey","id":"9","pubkey":"BAAA"}"#).unwrap();
        assert!(matches!(pubkey, ServerMessage::PeerPubkey { .. }));

        let left = ServerMessage::from_json(r#"{"type":"peer-left","id":"9"}"#).unwrap();
        assert_eq!(left, ServerMessage::PeerLeft { id: PeerId::from("9") });
    }

    #[test]
    fn unbekannter_typ_wird_abgelehnt() {
        assert!(ServerMessage::from_json(r#"{"type":"ping"}"#).is_err());
        assert!(ServerMessage::from_json(r#"{"id":"1"}"#).is_err());
        assert!(ServerMessage::from_json("kein json").is_err());
    }

    #[test]
    fn eingehendes_encr_message_ohne_from_abgelehnt() {
        let json = r#"{"type":"encr-message","to":"2","iv":"aXY=","ct":"Y3Q="}"#;
        assert!(ServerMessage::from_json(json).is_err());
    }
}
