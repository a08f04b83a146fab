//! Event-Loop einer Terminal-Sitzung
//!
//! Verbindet Relay, Tastatur und Session-Events:
//! - Relay-Nachrichten gehen an den SessionController, dessen Antworten
//!   zurueck an das Relay
//! - jede Eingabezeile ist ein `send_to_room`
//! - Chat-Eintraege und Warnungen werden auf stdout ausgegeben
//!
//! Nach einem Verbindungsabbruch endet die Sitzung; es gibt kein
//! automatisches Wiederverbinden.

use chrono::Local;
use raumchat_core::{PeerStatus, SessionEvent, SessionZustand};
use raumchat_session::SessionController;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::config::ClientConfig;
use crate::connection::RelayConnection;

/// Eine Eingabezeile des Benutzers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eingabe {
    /// Klartext an alle Peers
    Nachricht(String),
    /// `/peers` – Peer-Verzeichnis anzeigen
    Peers,
    /// `/quit` – Sitzung beenden
    Beenden,
    /// Leerzeile
    Leer,
}

impl Eingabe {
    pub fn parsen(zeile: &str) -> Self {
        let text = zeile.trim_end_matches(['\r', '\n']);
        match text.trim() {
            "" => Self::Leer,
            "/peers" => Self::Peers,
            "/quit" | "/exit" => Self::Beenden,
            _ => Self::Nachricht(text.to_string()),
        }
    }
}

/// Formatiert ein Session-Event fuer das Terminal
///
/// `None` fuer Events, die nicht angezeigt werden.
pub fn event_formatieren(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::ChatEintrag(eintrag) => {
            let zeit = eintrag.empfangen_am.with_timezone(&Local).format("%H:%M:%S");
            let marker = if eintrag.eigene { " (du)" } else { "" };
            Some(format!(
                "[{}] <{}{}> {}",
                zeit, eintrag.username, marker, eintrag.text
            ))
        }
        SessionEvent::Warnung(warnung) => Some(format!("! {}", warnung)),
        SessionEvent::ZustandGeaendert { nach, .. } => Some(format!("* Sitzung {}", nach)),
        SessionEvent::PeerAktualisiert {
            peer_id,
            username,
            status,
        } => match status {
            PeerStatus::KeyUnknown => Some(format!("* {} ({}) ist im Raum", username, peer_id)),
            PeerStatus::KeyKnown => Some(format!(
                "* {} ({}) ist verschluesselt erreichbar",
                username, peer_id
            )),
        },
        SessionEvent::PeerEntfernt { peer_id } => {
            Some(format!("* {} hat den Raum verlassen", peer_id))
        }
    }
}

fn peers_anzeigen(controller: &SessionController) {
    let peers: Vec<_> = controller.directory().list().collect();
    if peers.is_empty() {
        println!("* Niemand sonst im Raum");
        return;
    }
    for peer in peers {
        let status = match peer.status {
            PeerStatus::KeyKnown => "Schluessel bekannt",
            PeerStatus::KeyUnknown => "wartet auf Schluessel",
        };
        println!("* {} ({}): {}", peer.username, peer.id, status);
    }
}

/// Fuehrt eine Sitzung aus, bis Relay oder Benutzer sie beenden
pub async fn sitzung_ausfuehren(config: &ClientConfig) -> anyhow::Result<()> {
    let v = &config.verbindung;
    let mut controller = SessionController::neu(&v.room, &v.username, config.krypto.kdf);
    let events = controller.subscribe();

    let mut relay = RelayConnection::verbinden(&v.relay_url).await?;
    relay.senden(&controller.verbinden()?).await?;

    let eingabe = BufReader::new(tokio::io::stdin());
    sitzung_fuehren(
        &mut relay,
        &mut controller,
        events,
        eingabe,
        config.krypto.identitaet_erneuern,
    )
    .await
}

/// Event-Loop ueber einer bestehenden Verbindung
///
/// Der Controller steht danach immer auf `Getrennt`, auch wenn die Schleife
/// mit einem Fehler endet.
pub async fn sitzung_fuehren<R>(
    relay: &mut RelayConnection,
    controller: &mut SessionController,
    mut events: broadcast::Receiver<SessionEvent>,
    eingabe: R,
    identitaet_erneuern: bool,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let ergebnis = ereignisschleife(relay, controller, &mut events, eingabe.lines()).await;

    if controller.zustand() != SessionZustand::Getrennt {
        controller.trennen(identitaet_erneuern);
    }
    if let Err(e) = &ergebnis {
        tracing::warn!(fehler = %e, "Sitzung mit Fehler beendet");
    }

    // Restliche Events (z.B. letzte Chat-Zeilen) noch ausgeben
    while let Ok(event) = events.try_recv() {
        if let Some(zeile) = event_formatieren(&event) {
            println!("{}", zeile);
        }
    }

    tracing::info!(
        nachrichten = controller.chat_log().len(),
        "Sitzung beendet"
    );
    ergebnis
}

async fn ereignisschleife<R>(
    relay: &mut RelayConnection,
    controller: &mut SessionController,
    events: &mut broadcast::Receiver<SessionEvent>,
    mut zeilen: Lines<R>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        tokio::select! {
            nachricht = relay.empfangen() => {
                let Some(nachricht) = nachricht else {
                    return Ok(());
                };
                for antwort in controller.handle_event(nachricht) {
                    relay.senden(&antwort).await?;
                }
            }

            zeile = zeilen.next_line() => {
                let eingabe = match zeile? {
                    Some(zeile) => Eingabe::parsen(&zeile),
                    None => Eingabe::Beenden,
                };
                match eingabe {
                    Eingabe::Leer => {}
                    Eingabe::Peers => peers_anzeigen(controller),
                    Eingabe::Beenden => {
                        relay.schliessen().await;
                        return Ok(());
                    }
                    Eingabe::Nachricht(text) => match controller.send_to_room(&text) {
                        Ok(bericht) => {
                            for nachricht in &bericht.nachrichten {
                                relay.senden(nachricht).await?;
                            }
                        }
                        Err(e) => println!("! Nicht gesendet: {}", e),
                    },
                }
            }

            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(zeile) = event_formatieren(&event) {
                        println!("{}", zeile);
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(verpasst = n, "Terminal kommt mit Events nicht hinterher");
                }
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}
