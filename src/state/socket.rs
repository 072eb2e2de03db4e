use crate::state::messages::SocketCommand;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, warn};
use siot_core::TransportEvent;
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::AUTHORIZATION};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Owns the WebSocket. Reports connection changes and text frames, writes
/// whatever it is told to, and reconnects on a fixed interval.
#[derive(Debug)]
pub struct SocketWorker {
    pub url: String,
    pub auth_header: Option<String>,
    pub reconnect_interval: Duration,
    pub commands: mpsc::Receiver<SocketCommand>,
    pub events: mpsc::Sender<TransportEvent>,
}

impl SocketWorker {
    pub async fn run(mut self) {
        loop {
            let request = match build_request(&self.url, self.auth_header.as_deref()) {
                Ok(request) => request,
                Err(e) => {
                    error!("cannot build request for {}: {e}", self.url);
                    return;
                }
            };

            match connect_async(request).await {
                Ok((stream, _)) => {
                    if self.events.send(TransportEvent::Connected).await.is_err() {
                        return;
                    }
                    let (mut write, mut read) = stream.split();

                    loop {
                        tokio::select! {
                            maybe_cmd = self.commands.recv() => {
                                let Some(SocketCommand::Send(text)) = maybe_cmd else {
                                    return;
                                };
                                if let Err(e) = write.send(Message::Text(text.into())).await {
                                    warn!("socket send failed: {e}");
                                    break;
                                }
                            }
                            inbound = read.next() => {
                                match inbound {
                                    Some(Ok(Message::Text(text))) => {
                                        let _ = self.events.send(TransportEvent::Text(text.to_string())).await;
                                    }
                                    Some(Ok(Message::Close(frame))) => {
                                        debug!("server closed socket: {frame:?}");
                                        break;
                                    }
                                    None => break,
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        warn!("socket read failed: {e}");
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }
                Err(e) => warn!("connect to {} failed: {e}", self.url),
            }

            if self.events.send(TransportEvent::Disconnected).await.is_err() {
                return;
            }

            // Anything queued while offline is stale; the next connect re-registers.
            loop {
                match self.commands.try_recv() {
                    Ok(_) => {}
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => return,
                }
            }
            sleep(self.reconnect_interval).await;
        }
    }
}

fn build_request(url: &str, auth_header: Option<&str>) -> anyhow::Result<Request> {
    let mut request = url.into_client_request()?;
    if let Some(auth) = auth_header {
        request.headers_mut().insert(AUTHORIZATION, HeaderValue::from_str(auth)?);
    }
    Ok(request)
}
