//! Local stand-in for the scoring service. Each client's first frame is read
//! as its registration and answered with an empty snapshot. Every later text
//! frame is broadcast to all connected clients, so a second client can publish
//! game records by hand.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::env;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::{accept_async, tungstenite::Message};

#[derive(Debug, Deserialize)]
struct Registration {
    uid: String,
    school: String,
    #[serde(default)]
    sports: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = env::var("SIOT_RELAY_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = TcpListener::bind(&addr).await?;
    let (tx, _rx) = broadcast::channel::<String>(512);

    eprintln!("score relay listening on {addr}");

    loop {
        let (stream, peer) = listener.accept().await?;
        let tx = tx.clone();
        let rx = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, tx, rx).await {
                eprintln!("client {peer} disconnected: {e}");
            }
        });
    }
}

async fn handle_client(
    stream: TcpStream,
    tx: broadcast::Sender<String>,
    mut rx: broadcast::Receiver<String>,
) -> anyhow::Result<()> {
    let ws = accept_async(stream).await?;
    let (mut write, mut read) = ws.split();
    let mut registered = false;

    loop {
        tokio::select! {
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) if !registered => {
                        registered = true;
                        match serde_json::from_str::<Registration>(&text) {
                            Ok(reg) => eprintln!(
                                "registered uid {} for {} ({})",
                                reg.uid,
                                reg.school,
                                reg.sports.join(", ")
                            ),
                            Err(e) => eprintln!("unreadable registration: {e}"),
                        }
                        let snapshot = json!({ "init": true, "games": [] }).to_string();
                        write.send(Message::Text(snapshot.into())).await?;
                    }
                    Some(Ok(Message::Text(text))) => {
                        let _ = tx.send(text.to_string());
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Ok(text) => {
                        write.send(Message::Text(text.into())).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        eprintln!("slow client skipped {skipped} frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}
