//! Gemeinsame Identifikationstypen fuer raumchat
//!
//! Peer-IDs werden vom Relay vergeben und sind fuer den Client opak.
//! Das Newtype verhindert Verwechslungen mit Benutzernamen oder Raumnamen.

use serde::{Deserialize, Serialize};

/// Vom Relay vergebene Peer-ID (eindeutig innerhalb einer Raum-Session)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    /// Erstellt eine PeerId aus einem beliebigen String
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt die ID als String-Slice zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_id_serialisiert_als_string() {
        let id = PeerId::from("42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"42\"");
        let decoded: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn peer_id_anzeige() {
        assert_eq!(PeerId::new("abc").to_string(), "abc");
        assert_eq!(PeerId::new("abc").as_str(), "abc");
    }
}
