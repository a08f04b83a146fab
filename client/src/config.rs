//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Client ohne Konfigurationsdatei
//! lauffaehig ist. Einzelne Werte koennen per Umgebungsvariable
//! ueberschrieben werden (`RC_RELAY_URL`, `RC_ROOM`, `RC_USERNAME`).

use raumchat_core::RaumchatError;
use raumchat_crypto::KdfModus;
use serde::{Deserialize, Serialize};

use crate::logging::{log_format_gueltig, log_level_gueltig};

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Relay und Raum
    pub verbindung: VerbindungsEinstellungen,
    /// Schluessel-Ableitung und Identitaet
    pub krypto: KryptoEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Relay und Raum
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    /// WebSocket-URL des Relays (`ws://` oder `wss://`)
    pub relay_url: String,
    /// Name des Raums
    pub room: String,
    /// Anzeigename im Raum
    pub username: String,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        Self {
            relay_url: "ws://localhost:3001".into(),
            room: "test-room".into(),
            username: zufaelliger_username(),
        }
    }
}

/// `user` plus Zufallszahl unter 1000
fn zufaelliger_username() -> String {
    format!("user{}", rand::random::<u16>() % 1000)
}

/// Schluessel-Ableitung und Identitaet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KryptoEinstellungen {
    /// `hkdf_sha256` (Standard) oder `roh` fuer Browser-Kompatibilitaet
    pub kdf: KdfModus,
    /// Neues Schluessel-Paar nach Verbindungsabbruch
    pub identitaet_erneuern: bool,
}

impl Default for KryptoEinstellungen {
    fn default() -> Self {
        Self {
            kdf: KdfModus::HkdfSha256,
            identitaet_erneuern: true,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

/// Herkunft einer geladenen Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KonfigQuelle {
    Datei,
    /// Datei fehlt, alle Werte sind Standardwerte
    Standardwerte,
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert;
    /// die zweite Komponente sagt, woher die Werte stammen.
    ///
    /// Loggt selbst nichts; der Aufrufer meldet die Quelle nach dem
    /// Initialisieren des Loggings.
    pub fn laden(pfad: &str) -> anyhow::Result<(Self, KonfigQuelle)> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok((config, KonfigQuelle::Datei))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok((Self::default(), KonfigQuelle::Standardwerte))
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Uebernimmt `RC_RELAY_URL`, `RC_ROOM` und `RC_USERNAME` aus der Umgebung
    pub fn umgebung_anwenden(&mut self) {
        self.ueberschreiben_mit(|name| std::env::var(name).ok());
    }

    /// Ueberschreibt Verbindungswerte aus einer beliebigen Quelle
    pub fn ueberschreiben_mit(&mut self, quelle: impl Fn(&str) -> Option<String>) {
        if let Some(url) = quelle("RC_RELAY_URL") {
            self.verbindung.relay_url = url;
        }
        if let Some(room) = quelle("RC_ROOM") {
            self.verbindung.room = room;
        }
        if let Some(username) = quelle("RC_USERNAME") {
            self.verbindung.username = username;
        }
    }

    /// Prueft die Konfiguration vor dem Verbindungsaufbau
    pub fn validieren(&self) -> Result<(), RaumchatError> {
        let v = &self.verbindung;
        if !(v.relay_url.starts_with("ws://") || v.relay_url.starts_with("wss://")) {
            return Err(RaumchatError::Konfiguration(format!(
                "relay_url muss mit ws:// oder wss:// beginnen: '{}'",
                v.relay_url
            )));
        }
        if v.room.trim().is_empty() {
            return Err(RaumchatError::Konfiguration("room darf nicht leer sein".into()));
        }
        if v.username.trim().is_empty() {
            return Err(RaumchatError::Konfiguration(
                "username darf nicht leer sein".into(),
            ));
        }
        if !log_level_gueltig(&self.logging.level) {
            return Err(RaumchatError::Konfiguration(format!(
                "Unbekannter Log-Level '{}'",
                self.logging.level
            )));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(RaumchatError::Konfiguration(format!(
                "Unbekanntes Log-Format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }
}
