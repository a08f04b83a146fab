//! Raumchat Client – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet eine
//! Sitzung im konfigurierten Raum.

use anyhow::Result;
use raumchat_core::RaumchatError;
use raumchat_client::{
    config::{ClientConfig, KonfigQuelle},
    logging::logging_initialisieren,
    sitzung_ausfuehren,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("RAUMCHAT_CONFIG").unwrap_or_else(|_| "raumchat.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let (mut config, quelle) = ClientConfig::laden(&config_pfad)?;
    config.umgebung_anwenden();

    logging_initialisieren(&config.logging.level, &config.logging.format);
    if quelle == KonfigQuelle::Standardwerte {
        tracing::warn!(
            pfad = %config_pfad,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }
    config.validieren()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        room = %config.verbindung.room,
        kdf = %config.krypto.kdf,
        "Raumchat Client wird gestartet"
    );

    let ergebnis = sitzung_ausfuehren(&config).await;
    if let Some(e) = ergebnis.as_ref().err().and_then(|e| e.downcast_ref::<RaumchatError>()) {
        if e.ist_wiederholbar() {
            eprintln!("Relay nicht erreichbar oder Verbindung verloren; spaeter erneut starten.");
        }
    }
    ergebnis
}
