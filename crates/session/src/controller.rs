//! Session-Controller – Verarbeitet Relay-Events und Sendeauftraege
//!
//! Der Controller ist der einzige Besitzer von Peer-Verzeichnis,
//! CipherSession und Chat-Log. Eingehende Relay-Nachrichten und
//! Sendeauftraege der UI werden nacheinander verarbeitet; die Antworten
//! an das Relay werden als `ClientMessage`s zurueckgegeben, nicht selbst
//! gesendet.
//!
//! ## Zustandsmaschine
//! ```text
//! Getrennt --verbinden()--> Verbindend --peers--> Beigetreten --announce--> Aktiv
//!     ^                                                                      |
//!     +------------------------------ trennen() ----------------------------+
//! ```

use chrono::Utc;
use raumchat_core::{
    ChatLogEntry, PeerId, PeerStatus, SessionEvent, SessionZustand, Warnung, WarnungsArt,
};
use raumchat_crypto::{CipherSession, CryptoError, IdentityKeyPair, KdfModus, PublicKey};
use raumchat_protocol::{
    encoding, ClientMessage, DirectCiphertext, InboundCiphertext, RosterEntry, ServerMessage,
};
use tokio::sync::broadcast;

use crate::directory::{PeerDirectory, PeerRecord, RosterPeer};
use crate::error::{SessionError, SessionResult};

/// Groesse des Broadcast-Kanals fuer Session-Events
const EVENT_KANAL_GROESSE: usize = 256;

// ---------------------------------------------------------------------------
// Sendebericht
// ---------------------------------------------------------------------------

/// Ergebnis eines Sendeauftrags fuer einen einzelnen Peer
#[derive(Debug)]
pub enum PeerSendeErgebnis {
    /// Chiffrat erzeugt, Nachricht liegt im Bericht
    Gesendet,
    /// Peer hat noch keinen Schluessel; keine Zustellung, kein Nachholen
    Uebersprungen,
    /// Verschluesselung fuer diesen Peer fehlgeschlagen
    Fehlgeschlagen(CryptoError),
}

/// Ergebnis von [`SessionController::send_to_room`]
#[derive(Debug, Default)]
pub struct SendeBericht {
    /// Ausgehende Nachrichten (eine pro Peer mit Schluessel)
    pub nachrichten: Vec<ClientMessage>,
    /// Ein Ergebnis pro Peer im Verzeichnis
    pub ergebnisse: Vec<(PeerId, PeerSendeErgebnis)>,
    /// Lokales Echo, falls angelegt
    pub echo: Option<ChatLogEntry>,
}

impl SendeBericht {
    pub fn anzahl_gesendet(&self) -> usize {
        self.zaehlen(|e| matches!(e, PeerSendeErgebnis::Gesendet))
    }

    pub fn anzahl_uebersprungen(&self) -> usize {
        self.zaehlen(|e| matches!(e, PeerSendeErgebnis::Uebersprungen))
    }

    pub fn anzahl_fehlgeschlagen(&self) -> usize {
        self.zaehlen(|e| matches!(e, PeerSendeErgebnis::Fehlgeschlagen(_)))
    }

    fn zaehlen(&self, pred: impl Fn(&PeerSendeErgebnis) -> bool) -> usize {
        self.ergebnisse.iter().filter(|(_, e)| pred(e)).count()
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Orchestriert eine Raum-Session
pub struct SessionController {
    zustand: SessionZustand,
    room: String,
    username: String,
    local_id: Option<PeerId>,
    cipher: CipherSession,
    directory: PeerDirectory,
    chat_log: Vec<ChatLogEntry>,
    naechste_seq: u64,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Erstellt einen Controller mit frisch erzeugter Identitaet
    pub fn neu(room: impl Into<String>, username: impl Into<String>, modus: KdfModus) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_KANAL_GROESSE);
        Self {
            zustand: SessionZustand::Getrennt,
            room: room.into(),
            username: username.into(),
            local_id: None,
            cipher: CipherSession::new(IdentityKeyPair::generate(), modus),
            directory: PeerDirectory::neu(),
            chat_log: Vec::new(),
            naechste_seq: 1,
            event_tx,
        }
    }

    // -----------------------------------------------------------------------
    // Lebenszyklus
    // -----------------------------------------------------------------------

    /// Beginnt den Beitritt und liefert die `join`-Nachricht
    pub fn verbinden(&mut self) -> SessionResult<ClientMessage> {
        if self.zustand != SessionZustand::Getrennt {
            return Err(SessionError::FalscherZustand {
                zustand: self.zustand,
            });
        }
        tracing::info!(room = %self.room, username = %self.username, "Trete Raum bei");
        self.zustand_setzen(SessionZustand::Verbindend);
        Ok(ClientMessage::join(&self.room, &self.username))
    }

    /// Transport ist zu: Peer-Zustand verwerfen
    ///
    /// Das Chat-Log bleibt erhalten. Mit `identitaet_erneuern` wird fuer die
    /// naechste Verbindung ein neues Schluessel-Paar erzeugt.
    pub fn trennen(&mut self, identitaet_erneuern: bool) {
        self.directory.clear();
        self.local_id = None;
        if identitaet_erneuern {
            let modus = self.cipher.modus();
            self.cipher = CipherSession::new(IdentityKeyPair::generate(), modus);
            tracing::info!("Neue Identitaet erzeugt");
        }
        self.zustand_setzen(SessionZustand::Getrennt);
    }

    /// Empfaenger fuer alle Session-Events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    // -----------------------------------------------------------------------
    // Eingehende Relay-Events
    // -----------------------------------------------------------------------

    /// Verarbeitet eine Nachricht des Relays
    ///
    /// Gibt die Nachrichten zurueck, die als Reaktion an das Relay gehen.
    /// Fehler einzelner Nachrichten werden als Warnung gemeldet und beenden
    /// die Session nie.
    pub fn handle_event(&mut self, nachricht: ServerMessage) -> Vec<ClientMessage> {
        match nachricht {
            ServerMessage::Peers { you, peers } => return self.roster_empfangen(you, peers),
            _ if self.zustand != SessionZustand::Aktiv => {
                tracing::debug!(
                    typ = nachricht.typ(),
                    zustand = %self.zustand,
                    "Event vor Roster ignoriert"
                );
            }
            ServerMessage::PeerJoined { id, username } => self.peer_beigetreten(id, username),
            ServerMessage::PeerPubkey { id, pubkey } => self.peer_schluessel(id, &pubkey),
            ServerMessage::PeerLeft { id } => {
                if self.directory.remove_peer(&id).is_some() {
                    self.event_senden(SessionEvent::PeerEntfernt { peer_id: id });
                }
            }
            ServerMessage::EncrMessage(c) => self.chiffrat_empfangen(c, true),
            ServerMessage::BroadcastEncrMessage(c) => self.chiffrat_empfangen(c, false),
        }
        Vec::new()
    }

    fn roster_empfangen(&mut self, you: PeerId, peers: Vec<RosterEntry>) -> Vec<ClientMessage> {
        if self.zustand != SessionZustand::Verbindend {
            tracing::warn!(zustand = %self.zustand, "Unerwarteter Roster ignoriert");
            return Vec::new();
        }

        let mut roster = Vec::with_capacity(peers.len());
        for entry in peers {
            if entry.id == you {
                continue;
            }
            let public_key = match entry.pubkey.as_deref().map(schluessel_parsen) {
                Some(Ok(key)) => Some(key),
                Some(Err(e)) => {
                    self.warnen(Warnung::fuer_peer(
                        WarnungsArt::UngueltigerSchluessel,
                        &entry.id,
                        e.to_string(),
                    ));
                    None
                }
                None => None,
            };
            roster.push(RosterPeer {
                id: entry.id,
                username: entry.username,
                public_key,
            });
        }
        self.directory.upsert_roster(roster);

        tracing::info!(local_id = %you, peers = self.directory.len(), "Roster empfangen");
        self.local_id = Some(you);
        self.zustand_setzen(SessionZustand::Beigetreten);

        for peer in self.directory.list() {
            self.event_senden(SessionEvent::PeerAktualisiert {
                peer_id: peer.id,
                username: peer.username,
                status: peer.status,
            });
        }

        let ankuendigung = ClientMessage::AnnouncePubkey {
            pubkey: encoding::encode(&self.cipher.identity().export_public()),
        };
        self.zustand_setzen(SessionZustand::Aktiv);
        vec![ankuendigung]
    }

    fn peer_beigetreten(&mut self, id: PeerId, username: String) {
        if self.ist_lokal(&id) {
            return;
        }
        if self.directory.add_peer(id.clone(), username.clone()) {
            let status = self.directory.status(&id).unwrap_or(PeerStatus::KeyUnknown);
            self.event_senden(SessionEvent::PeerAktualisiert {
                peer_id: id,
                username,
                status,
            });
        } else {
            self.warnen(Warnung::fuer_peer(
                WarnungsArt::DoppelterBeitritt,
                &id,
                "Peer ist bereits im Raum",
            ));
        }
    }

    fn peer_schluessel(&mut self, id: PeerId, pubkey: &str) {
        if self.ist_lokal(&id) {
            return;
        }
        match schluessel_parsen(pubkey) {
            Ok(key) => {
                self.directory.set_public_key(&id, key);
                tracing::debug!(peer_id = %id, "Peer-Schluessel erhalten");
                let username = self
                    .directory
                    .get(&id)
                    .map(|p| p.username)
                    .unwrap_or_default();
                self.event_senden(SessionEvent::PeerAktualisiert {
                    peer_id: id,
                    username,
                    status: PeerStatus::KeyKnown,
                });
            }
            Err(e) => self.warnen(Warnung::fuer_peer(
                WarnungsArt::UngueltigerSchluessel,
                &id,
                e.to_string(),
            )),
        }
    }

    fn chiffrat_empfangen(&mut self, c: InboundCiphertext, direkt: bool) {
        if self.ist_lokal(&c.from) {
            tracing::debug!("Chiffrat mit eigener Absender-ID verworfen");
            return;
        }

        let ergebnis = match self.directory.record_mut(&c.from) {
            Some(record) => {
                let username = record.username().to_string();
                Some(entschluesseln(&self.cipher, record, &c).map(|text| (username, text)))
            }
            None => None,
        };

        match ergebnis {
            Some(Ok((username, text))) => {
                self.anhaengen(c.from, username, text, false);
            }
            // Broadcasts: Fehlschlag ist der Normalfall fuer Nicht-Empfaenger
            Some(Err(e)) if !direkt && e.ist_routine() => {
                tracing::trace!(peer_id = %c.from, fehler = %e, "Broadcast nicht fuer uns");
            }
            None if !direkt => {
                tracing::trace!(peer_id = %c.from, "Broadcast von unbekanntem Peer");
            }
            Some(Err(e)) => {
                self.warnen(Warnung::fuer_peer(warnungsart(&e), &c.from, e.to_string()));
            }
            None => {
                self.warnen(Warnung::fuer_peer(
                    WarnungsArt::UnbekannterAbsender,
                    &c.from,
                    "Nachricht von unbekanntem Peer verworfen",
                ));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Senden
    // -----------------------------------------------------------------------

    /// Verschluesselt `text` einzeln fuer jeden Peer mit bekanntem Schluessel
    ///
    /// Peers ohne Schluessel werden uebersprungen. Das lokale Echo wird
    /// angelegt, ausser alle Verschluesselungsversuche sind gescheitert.
    pub fn send_to_room(&mut self, text: &str) -> SessionResult<SendeBericht> {
        let local_id = match (&self.zustand, &self.local_id) {
            (SessionZustand::Aktiv, Some(id)) => id.clone(),
            _ => {
                return Err(SessionError::FalscherZustand {
                    zustand: self.zustand,
                })
            }
        };

        let mut bericht = SendeBericht::default();
        for record in self.directory.records_mut() {
            let peer_id = record.id().clone();
            if record.status() == PeerStatus::KeyUnknown {
                bericht.ergebnisse.push((peer_id, PeerSendeErgebnis::Uebersprungen));
                continue;
            }
            match self.cipher.encrypt(record, text.as_bytes()) {
                Ok(payload) => {
                    bericht
                        .nachrichten
                        .push(ClientMessage::EncrMessage(DirectCiphertext {
                            to: peer_id.clone(),
                            iv: encoding::encode(payload.nonce.as_bytes()),
                            ct: encoding::encode(&payload.ciphertext),
                        }));
                    bericht.ergebnisse.push((peer_id, PeerSendeErgebnis::Gesendet));
                }
                Err(e) => {
                    bericht
                        .ergebnisse
                        .push((peer_id, PeerSendeErgebnis::Fehlgeschlagen(e)));
                }
            }
        }

        let fehlgeschlagen: Vec<Warnung> = bericht
            .ergebnisse
            .iter()
            .filter_map(|(id, e)| match e {
                PeerSendeErgebnis::Fehlgeschlagen(fehler) => Some(Warnung::fuer_peer(
                    WarnungsArt::SendenFehlgeschlagen,
                    id,
                    fehler.to_string(),
                )),
                _ => None,
            })
            .collect();
        for warnung in fehlgeschlagen {
            self.warnen(warnung);
        }

        let versucht = bericht.anzahl_gesendet() + bericht.anzahl_fehlgeschlagen();
        if versucht == 0 || bericht.anzahl_gesendet() > 0 {
            let username = self.username.clone();
            bericht.echo = Some(self.anhaengen(local_id, username, text.to_string(), true));
        }

        tracing::debug!(
            gesendet = bericht.anzahl_gesendet(),
            uebersprungen = bericht.anzahl_uebersprungen(),
            fehlgeschlagen = bericht.anzahl_fehlgeschlagen(),
            "Nachricht an Raum verteilt"
        );
        Ok(bericht)
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn zustand(&self) -> SessionZustand {
        self.zustand
    }

    pub fn local_id(&self) -> Option<&PeerId> {
        self.local_id.as_ref()
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn kdf_modus(&self) -> KdfModus {
        self.cipher.modus()
    }

    /// Eigener oeffentlicher Schluessel (unkomprimierter SEC1-Punkt)
    pub fn eigener_schluessel(&self) -> Vec<u8> {
        self.cipher.identity().export_public()
    }

    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    pub fn peer_status(&self, id: &PeerId) -> Option<PeerStatus> {
        self.directory.status(id)
    }

    /// Append-only Chat-Log in Einfuegereihenfolge
    pub fn chat_log(&self) -> &[ChatLogEntry] {
        &self.chat_log
    }

    // -----------------------------------------------------------------------
    // Intern
    // -----------------------------------------------------------------------

    fn ist_lokal(&self, id: &PeerId) -> bool {
        self.local_id.as_ref() == Some(id)
    }

    fn anhaengen(
        &mut self,
        from: PeerId,
        username: String,
        text: String,
        eigene: bool,
    ) -> ChatLogEntry {
        let entry = ChatLogEntry {
            seq: self.naechste_seq,
            from,
            username,
            text,
            eigene,
            empfangen_am: Utc::now(),
        };
        self.naechste_seq += 1;
        self.chat_log.push(entry.clone());
        self.event_senden(SessionEvent::ChatEintrag(entry.clone()));
        entry
    }

    fn zustand_setzen(&mut self, nach: SessionZustand) {
        let von = self.zustand;
        if von == nach {
            return;
        }
        self.zustand = nach;
        tracing::debug!(von = %von, nach = %nach, "Session-Zustand geaendert");
        self.event_senden(SessionEvent::ZustandGeaendert { von, nach });
    }

    fn warnen(&self, warnung: Warnung) {
        tracing::warn!(
            art = ?warnung.art,
            peer_id = ?warnung.peer_id,
            details = %warnung.details,
            "Session-Warnung"
        );
        self.event_senden(SessionEvent::Warnung(warnung));
    }

    fn event_senden(&self, event: SessionEvent) {
        // Ohne Subscriber schlaegt send fehl; das ist kein Fehler
        let _ = self.event_tx.send(event);
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("zustand", &self.zustand)
            .field("room", &self.room)
            .field("local_id", &self.local_id)
            .field("peers", &self.directory.len())
            .field("chat_log", &self.chat_log.len())
            .finish()
    }
}

/// Base64 dekodieren und Punkt validieren
fn schluessel_parsen(pubkey: &str) -> SessionResult<PublicKey> {
    let bytes = encoding::decode(pubkey)?;
    Ok(PublicKey::from_sec1_bytes(&bytes)?)
}

fn entschluesseln(
    cipher: &CipherSession,
    record: &mut PeerRecord,
    c: &InboundCiphertext,
) -> SessionResult<String> {
    let iv = encoding::decode(&c.iv)?;
    let ct = encoding::decode(&c.ct)?;
    let klartext = cipher.decrypt(record, &iv, &ct)?;
    String::from_utf8(klartext).map_err(|_| SessionError::KeinUtf8)
}

fn warnungsart(fehler: &SessionError) -> WarnungsArt {
    match fehler {
        SessionError::Krypto(CryptoError::Authentifizierung) => WarnungsArt::Authentifizierung,
        SessionError::Krypto(CryptoError::KeinPeerSchluessel { .. }) => WarnungsArt::KeinSchluessel,
        SessionError::Krypto(CryptoError::KeyAgreement(_)) => WarnungsArt::UngueltigerSchluessel,
        _ => WarnungsArt::UngueltigeNachricht,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
