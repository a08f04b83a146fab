//! Integration-Tests fuer RelayConnection gegen ein lokales WebSocket-Relay

use futures_util::{SinkExt, StreamExt};
use raumchat_client::{sitzung_fuehren, RelayConnection};
use raumchat_core::{PeerId, SessionZustand};
use raumchat_crypto::KdfModus;
use raumchat_protocol::{
    encoding, ClientMessage, InboundCiphertext, RosterEntry, ServerMessage,
};
use raumchat_session::SessionController;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

async fn relay_starten() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

async fn annehmen(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    accept_async(stream).await.unwrap()
}

async fn client_nachricht(ws: &mut WebSocketStream<TcpStream>) -> ClientMessage {
    loop {
        match ws.next().await.expect("Client hat getrennt").unwrap() {
            Message::Text(text) => return ClientMessage::from_json(&text).unwrap(),
            _ => continue,
        }
    }
}

async fn server_senden(ws: &mut WebSocketStream<TcpStream>, nachricht: &ServerMessage) {
    ws.send(Message::Text(nachricht.to_json().unwrap()))
        .await
        .unwrap();
}

#[tokio::test]
async fn join_senden_und_ungueltige_frames_ueberspringen() {
    let (listener, url) = relay_starten().await;

    let relay = tokio::spawn(async move {
        let mut ws = annehmen(&listener).await;
        let join = client_nachricht(&mut ws).await;
        assert_eq!(join, ClientMessage::join("lobby", "alice"));

        ws.send(Message::Text("kein json".into())).await.unwrap();
        ws.send(Message::Text(r#"{"type":"unbekannt"}"#.into()))
            .await
            .unwrap();
        server_senden(
            &mut ws,
            &ServerMessage::Peers {
                you: PeerId::from("1"),
                peers: Vec::new(),
            },
        )
        .await;
        ws.send(Message::Ping(vec![1, 2, 3])).await.unwrap();
        ws.close(None).await.unwrap();

        let mut pong_erhalten = false;
        while let Some(Ok(nachricht)) = ws.next().await {
            if nachricht == Message::Pong(vec![1, 2, 3]) {
                pong_erhalten = true;
            }
        }
        pong_erhalten
    });

    let mut conn = RelayConnection::verbinden(&url).await.unwrap();
    assert_eq!(conn.url(), url);
    conn.senden(&ClientMessage::join("lobby", "alice"))
        .await
        .unwrap();

    match conn.empfangen().await {
        Some(ServerMessage::Peers { you, peers }) => {
            assert_eq!(you, PeerId::from("1"));
            assert!(peers.is_empty());
        }
        andere => panic!("Erwartet peers, erhalten {:?}", andere),
    }

    // Ping beantwortet tungstenite, danach Close
    assert!(conn.empfangen().await.is_none());
    drop(conn);
    assert!(relay.await.unwrap(), "Relay hat kein Pong erhalten");
}

#[tokio::test]
async fn verbinden_zu_nicht_erreichbarem_relay_schlaegt_fehl() {
    let (listener, url) = relay_starten().await;
    drop(listener);
    let ergebnis = RelayConnection::verbinden(&url).await;
    assert!(matches!(
        ergebnis,
        Err(raumchat_core::RaumchatError::Verbindung(_))
    ));
}

#[tokio::test]
async fn ende_zu_ende_ueber_websocket() {
    let (listener, url) = relay_starten().await;

    // Bob lebt im Relay-Task und ist dort schon beigetreten
    let relay = tokio::spawn(async move {
        let mut bob = SessionController::neu("lobby", "bob", KdfModus::HkdfSha256);
        bob.verbinden().unwrap();
        let bob_announce = bob.handle_event(ServerMessage::Peers {
            you: PeerId::from("2"),
            peers: Vec::new(),
        });
        let bob_pubkey = match bob_announce.as_slice() {
            [ClientMessage::AnnouncePubkey { pubkey }] => pubkey.clone(),
            andere => panic!("Unerwartet: {:?}", andere),
        };

        let mut ws = annehmen(&listener).await;
        assert!(matches!(
            client_nachricht(&mut ws).await,
            ClientMessage::Join { .. }
        ));
        bob.handle_event(ServerMessage::PeerJoined {
            id: PeerId::from("1"),
            username: "alice".into(),
        });

        server_senden(
            &mut ws,
            &ServerMessage::Peers {
                you: PeerId::from("1"),
                peers: vec![RosterEntry {
                    id: PeerId::from("2"),
                    username: "bob".into(),
                    pubkey: Some(bob_pubkey),
                }],
            },
        )
        .await;

        let alice_pubkey = match client_nachricht(&mut ws).await {
            ClientMessage::AnnouncePubkey { pubkey } => pubkey,
            andere => panic!("Erwartet announce-pubkey, erhalten {:?}", andere),
        };
        assert_eq!(encoding::decode(&alice_pubkey).unwrap().len(), 65);
        bob.handle_event(ServerMessage::PeerPubkey {
            id: PeerId::from("1"),
            pubkey: alice_pubkey,
        });

        match client_nachricht(&mut ws).await {
            ClientMessage::EncrMessage(d) => {
                assert_eq!(d.to, PeerId::from("2"));
                bob.handle_event(ServerMessage::EncrMessage(InboundCiphertext {
                    from: PeerId::from("1"),
                    iv: d.iv,
                    ct: d.ct,
                }));
            }
            andere => panic!("Erwartet encr-message, erhalten {:?}", andere),
        }
        bob.chat_log().to_vec()
    });

    let mut alice = SessionController::neu("lobby", "alice", KdfModus::HkdfSha256);
    let mut conn = RelayConnection::verbinden(&url).await.unwrap();
    conn.senden(&alice.verbinden().unwrap()).await.unwrap();

    let roster = conn.empfangen().await.unwrap();
    for antwort in alice.handle_event(roster) {
        conn.senden(&antwort).await.unwrap();
    }
    let bericht = alice.send_to_room("ueber den draht").unwrap();
    for nachricht in &bericht.nachrichten {
        conn.senden(nachricht).await.unwrap();
    }

    let bob_log = relay.await.unwrap();
    assert_eq!(bob_log.len(), 1);
    assert_eq!(bob_log[0].username, "alice");
    assert_eq!(bob_log[0].text, "ueber den draht");
}

#[tokio::test]
async fn sendefehler_trennt_die_session() {
    let (listener, url) = relay_starten().await;
    let (fertig_tx, fertig_rx) = oneshot::channel::<()>();

    let relay = tokio::spawn(async move {
        let mut ws = annehmen(&listener).await;
        assert!(matches!(
            client_nachricht(&mut ws).await,
            ClientMessage::Join { .. }
        ));
        server_senden(
            &mut ws,
            &ServerMessage::Peers {
                you: PeerId::from("1"),
                peers: vec![RosterEntry {
                    id: PeerId::from("2"),
                    username: "bob".into(),
                    pubkey: Some(encoding::encode(
                        &raumchat_crypto::IdentityKeyPair::generate().export_public(),
                    )),
                }],
            },
        )
        .await;
        // Verbindung offen halten, ohne weiter zu lesen
        let _ = fertig_rx.await;
    });

    let mut alice = SessionController::neu("lobby", "alice", KdfModus::HkdfSha256);
    let events = alice.subscribe();
    let mut conn = RelayConnection::verbinden(&url).await.unwrap();
    conn.senden(&alice.verbinden().unwrap()).await.unwrap();
    let roster = conn.empfangen().await.unwrap();
    for antwort in alice.handle_event(roster) {
        conn.senden(&antwort).await.unwrap();
    }
    assert_eq!(alice.zustand(), SessionZustand::Aktiv);

    // Nach dem eigenen Close schlaegt jedes weitere Senden fehl
    conn.schliessen().await;

    let ergebnis = sitzung_fuehren(
        &mut conn,
        &mut alice,
        events,
        &b"an bob\n"[..],
        false,
    )
    .await;

    assert!(ergebnis.is_err());
    assert_eq!(alice.zustand(), SessionZustand::Getrennt);
    assert!(alice.directory().is_empty());
    assert!(alice.local_id().is_none());

    let _ = fertig_tx.send(());
    relay.await.unwrap();
}
