use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, FeedKind};
use crate::state::messages::NotifierResponse;
use siot_core::notifier::NotifyOutcome;
use siot_core::{ClientError, ClientEvent, ConnectionState, GameInfo, SiotClient, TransportEvent};
use tokio::sync::mpsc;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Dashboard,
    Feed,
    Help,
}

/// One dashboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct SportRow<'a> {
    pub sport: &'a str,
    pub latest: Option<&'a GameInfo>,
    pub hours_since_win: Option<u64>,
}

pub struct App {
    pub settings: AppSettings,
    pub client: SiotClient,
    pub state: AppState,
}

impl App {
    /// Build the client and route its observers into `events`, so the UI loop
    /// handles them after the client call returns.
    pub fn new(
        settings: AppSettings,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Result<Self, ClientError> {
        let mut client = SiotClient::new(settings.client_config())?;

        let init_tx = events.clone();
        client.on_init(move |count| {
            let _ = init_tx.send(ClientEvent::Init { count });
        });
        let update_tx = events.clone();
        client.on_update(move |game| {
            let _ = update_tx.send(ClientEvent::Update(game.clone()));
        });
        client.on_win(move |game| {
            let _ = events.send(ClientEvent::Win(game.clone()));
        });

        log::set_max_level(settings.log_level);
        tui_logger::set_default_level(settings.log_level);

        Ok(Self {
            client,
            settings,
            state: AppState::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Socket and client handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    /// Feed a transport event to the client and return the texts to send.
    pub fn on_transport(&mut self, event: TransportEvent) -> Vec<String> {
        let was_connected = self.client.is_connected();
        match &event {
            TransportEvent::Connected => {
                self.state.last_error = None;
                self.state
                    .feed
                    .push(FeedKind::System, format!("connected to {}", self.client.endpoint()));
            }
            TransportEvent::Disconnected if was_connected => {
                self.state.feed.push(FeedKind::System, "disconnected, retrying...");
            }
            _ => {}
        }
        self.client.handle_transport(event);
        self.client.drain_outbound()
    }

    /// Returns the game when it should go to the legacy notifier.
    pub fn on_client_event(&mut self, event: ClientEvent) -> Option<GameInfo> {
        match event {
            ClientEvent::Init { count } => {
                self.state.last_init_count = Some(count);
                self.state
                    .feed
                    .push(FeedKind::Init, format!("snapshot received: {count} games"));
                None
            }
            ClientEvent::Update(game) => {
                self.state.feed.push_game(FeedKind::Update, &game);
                None
            }
            ClientEvent::Win(game) => {
                self.state.feed.push_game(FeedKind::Win, &game);
                Some(game)
            }
        }
    }

    pub fn on_notifier_response(&mut self, response: NotifierResponse) {
        match response {
            NotifierResponse::Outcome { game, outcome: NotifyOutcome::Posted { code } } => {
                self.state.feed.push(
                    FeedKind::System,
                    format!("legacy status set for {code} in {}", game.sport),
                );
            }
            NotifierResponse::Outcome { .. } => {}
            NotifierResponse::Error { message } => {
                self.state.feed.push(FeedKind::System, format!("notifier error: {message}"));
                self.state.last_error = Some(message);
            }
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.client.state()
    }

    pub fn sport_rows(&self) -> Vec<SportRow<'_>> {
        self.client
            .watched_sports()
            .iter()
            .map(|sport| SportRow {
                sport,
                latest: self.client.latest(sport),
                hours_since_win: self.client.hours_since_last_win(sport),
            })
            .collect()
    }

    pub fn selected_row(&self) -> Option<SportRow<'_>> {
        self.sport_rows().into_iter().nth(self.state.selected_sport)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        if next == MenuItem::Feed {
            self.state.feed.scroll_offset = 0;
        }
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn select_next_sport(&mut self) {
        let count = self.client.watched_sports().len();
        self.state.select_next(count);
    }

    pub fn select_prev_sport(&mut self) {
        self.state.select_prev();
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn app() -> (App, mpsc::UnboundedReceiver<ClientEvent>) {
        let env: HashMap<&str, &str> = [
            ("SIOT_UID", "123456"),
            ("SIOT_SCHOOL", "Montana"),
            ("SIOT_SPORTS", "Football,Basketball"),
        ]
        .into_iter()
        .collect();
        let settings = AppSettings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(settings, tx).unwrap(), rx)
    }

    #[test]
    fn connect_returns_registration_to_send() {
        let (mut app, _rx) = app();
        let out = app.on_transport(TransportEvent::Connected);
        assert_eq!(out.len(), 1);
        assert!(out[0].contains(r#""school":"Montana""#));
        assert_eq!(app.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn observers_forward_events_over_the_channel() {
        let (mut app, mut rx) = app();
        app.on_transport(TransportEvent::Text(
            r#"{"id": 3, "sport": "Football", "winner": "Montana", "date": "2024-09-01"}"#.into(),
        ));

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert!(matches!(first, ClientEvent::Update(ref g) if g.id == 3));
        assert!(matches!(second, ClientEvent::Win(ref g) if g.id == 3));

        assert!(app.on_client_event(first).is_none());
        assert_eq!(app.on_client_event(second).map(|g| g.id), Some(3));
        assert_eq!(app.state.feed.entries.len(), 2);
    }

    #[test]
    fn rows_follow_watched_order() {
        let (mut app, _rx) = app();
        app.on_transport(TransportEvent::Text(r#"{"id": 4, "sport": "Basketball"}"#.into()));
        let rows = app.sport_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sport, "Football");
        assert!(rows[0].latest.is_none());
        assert_eq!(rows[1].latest.map(|g| g.id), Some(4));
        assert_eq!(rows[1].hours_since_win, None);
    }

    #[test]
    fn init_count_is_remembered() {
        let (mut app, _rx) = app();
        app.on_client_event(ClientEvent::Init { count: 5 });
        assert_eq!(app.state.last_init_count, Some(5));
    }
}
