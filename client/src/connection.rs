//! WebSocket-Verbindung zum Relay
//!
//! Jede Nachricht ist ein JSON-Textframe (siehe `raumchat-protocol`).
//! Pings beantwortet tungstenite selbst beim naechsten Lesen oder Schreiben;
//! Frames, die sich nicht parsen lassen, werden geloggt und uebersprungen.

use futures_util::{SinkExt, StreamExt};
use raumchat_core::RaumchatError;
use raumchat_protocol::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Offene Verbindung zum Relay
pub struct RelayConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    url: String,
}

impl RelayConnection {
    /// Baut die WebSocket-Verbindung auf (TLS via rustls bei `wss://`)
    pub async fn verbinden(url: &str) -> Result<Self, RaumchatError> {
        tracing::info!("Verbinde mit {}", url);
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| RaumchatError::Verbindung(format!("{url}: {e}")))?;
        Ok(Self {
            ws,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sendet eine Nachricht als JSON-Textframe
    pub async fn senden(&mut self, nachricht: &ClientMessage) -> Result<(), RaumchatError> {
        let json = nachricht
            .to_json()
            .map_err(|e| RaumchatError::intern(e.to_string()))?;
        tracing::trace!(typ = nachricht.typ(), "Sende an Relay");
        self.ws
            .send(Message::Text(json))
            .await
            .map_err(|e| RaumchatError::Getrennt(e.to_string()))
    }

    /// Wartet auf die naechste Relay-Nachricht
    ///
    /// `None` bei Close-Frame, Stream-Ende oder Transportfehler.
    pub async fn empfangen(&mut self) -> Option<ServerMessage> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => match ServerMessage::from_json(&text) {
                    Ok(nachricht) => {
                        tracing::trace!(typ = nachricht.typ(), "Relay-Nachricht empfangen");
                        return Some(nachricht);
                    }
                    Err(e) => {
                        tracing::warn!(fehler = %e, "Ungueltige Relay-Nachricht uebersprungen");
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(grund = ?frame, "Relay hat die Verbindung geschlossen");
                    return None;
                }
                None => {
                    tracing::info!("Verbindung zum Relay beendet");
                    return None;
                }
                Some(Err(e)) => {
                    tracing::warn!(fehler = %e, "Transportfehler");
                    return None;
                }
                // Ping/Pong/Binary
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Schliesst die Verbindung geordnet
    pub async fn schliessen(&mut self) {
        if let Err(e) = self.ws.close(None).await {
            tracing::debug!(fehler = %e, "Schliessen fehlgeschlagen");
        }
    }
}

impl std::fmt::Debug for RelayConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConnection")
            .field("url", &self.url)
            .finish()
    }
}
