use crate::state::messages::NotifierResponse;
use chrono::Utc;
use log::{debug, error};
use siot_core::GameInfo;
use siot_core::notifier::LegacyNotifier;
use tokio::sync::mpsc;

/// Forwards win events to the legacy CGI, one request at a time.
pub struct NotifierWorker {
    notifier: LegacyNotifier,
    requests: mpsc::Receiver<GameInfo>,
    responses: mpsc::Sender<NotifierResponse>,
}

impl NotifierWorker {
    pub fn new(
        notifier: LegacyNotifier,
        requests: mpsc::Receiver<GameInfo>,
        responses: mpsc::Sender<NotifierResponse>,
    ) -> Self {
        Self { notifier, requests, responses }
    }

    pub async fn run(mut self) {
        while let Some(game) = self.requests.recv().await {
            debug!("notifying {} of game {}", self.notifier.url(), game.id);

            let response = match self.notifier.notify_win(&game, Utc::now()).await {
                Ok(outcome) => NotifierResponse::Outcome { game, outcome },
                Err(err) => NotifierResponse::Error { message: err.to_string() },
            };

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send notifier response: {e}");
                break;
            }
        }
    }
}
