use crate::calendar::{Clock, SystemClock};
use crate::dispatch::{Dispatch, dispatch_text};
use crate::endpoint::{Endpoint, EndpointError};
use crate::events::Observers;
use crate::store::SportStore;
use crate::{GameInfo, Registration};
use log::{error, info, warn};
use std::collections::VecDeque;
use std::fmt;

/// Connection lifecycle as seen by the client. Only transport events move it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    /// Transition table. Text frames never change the state.
    pub fn next(self, event: &TransportEvent) -> Self {
        match event {
            TransportEvent::Connected => ConnectionState::Connected,
            TransportEvent::Disconnected => ConnectionState::Disconnected,
            TransportEvent::Text(_) => self,
        }
    }
}

/// What the transport reports, one event per poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// `ws://host:port/ws/{uid}` or the `wss://` equivalent.
    pub url: String,
    pub uid: String,
    pub school: String,
    pub sports: Vec<String>,
    /// Sent once per connection as `Authorization: Bearer <token>`.
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    Endpoint(EndpointError),
    MissingUid,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Endpoint(e) => write!(f, "bad endpoint: {e}"),
            ClientError::MissingUid => write!(f, "device uid must not be empty"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<EndpointError> for ClientError {
    fn from(e: EndpointError) -> Self {
        ClientError::Endpoint(e)
    }
}

/// Client for the scoring service.
///
/// Transport-agnostic: feed it [`TransportEvent`]s with
/// [`handle_transport`](Self::handle_transport) and hand whatever
/// [`drain_outbound`](Self::drain_outbound) returns to the socket.
pub struct SiotClient {
    endpoint: Endpoint,
    uid: String,
    school: String,
    auth_token: Option<String>,
    state: ConnectionState,
    store: SportStore,
    observers: Observers,
    clock: Box<dyn Clock>,
    outbox: VecDeque<String>,
}

impl fmt::Debug for SiotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiotClient")
            .field("endpoint", &self.endpoint)
            .field("uid", &self.uid)
            .field("school", &self.school)
            .field("state", &self.state)
            .field("sports", &self.store.sports())
            .field("observers", &self.observers)
            .field("outbox", &self.outbox.len())
            .finish()
    }
}

impl SiotClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.uid.trim().is_empty() {
            return Err(ClientError::MissingUid);
        }
        let endpoint = Endpoint::parse(&config.url)?;

        let mut store = SportStore::new();
        let dropped = store.set_watched_sports(config.sports);
        if dropped > 0 {
            warn!("ignored {dropped} duplicate or excess sports from config");
        }

        Ok(Self {
            endpoint,
            uid: config.uid,
            school: config.school,
            auth_token: config.auth_token.filter(|t| !t.is_empty()),
            state: ConnectionState::Disconnected,
            store,
            observers: Observers::default(),
            clock: Box::new(SystemClock),
            outbox: VecDeque::new(),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn school(&self) -> &str {
        &self.school
    }

    pub fn watched_sports(&self) -> &[String] {
        self.store.sports()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// `Authorization` header value for the connect handshake.
    pub fn auth_header(&self) -> Option<String> {
        self.auth_token.as_ref().map(|t| format!("Bearer {t}"))
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    pub fn on_init(&mut self, cb: impl FnMut(usize) + Send + 'static) {
        self.observers.on_init = Some(Box::new(cb));
    }

    pub fn on_update(&mut self, cb: impl FnMut(&GameInfo) + Send + 'static) {
        self.observers.on_update = Some(Box::new(cb));
    }

    pub fn on_win(&mut self, cb: impl FnMut(&GameInfo) + Send + 'static) {
        self.observers.on_win = Some(Box::new(cb));
    }

    // -----------------------------------------------------------------------
    // Transport input
    // -----------------------------------------------------------------------

    pub fn handle_transport(&mut self, event: TransportEvent) -> Option<Dispatch> {
        let previous = self.state;
        self.state = previous.next(&event);

        match event {
            TransportEvent::Connected => {
                info!("connected to {}", self.endpoint);
                self.queue_registration();
                None
            }
            TransportEvent::Disconnected => {
                if previous == ConnectionState::Connected {
                    info!("disconnected from {}", self.endpoint);
                }
                self.outbox.clear();
                None
            }
            TransportEvent::Text(payload) => Some(self.handle_text(&payload)),
        }
    }

    pub fn handle_text(&mut self, payload: &str) -> Dispatch {
        dispatch_text(payload, &mut self.store, &self.school, &mut self.observers)
    }

    /// Texts waiting to go out, oldest first.
    pub fn drain_outbound(&mut self) -> Vec<String> {
        self.outbox.drain(..).collect()
    }

    // -----------------------------------------------------------------------
    // Application-facing mutations and queries
    // -----------------------------------------------------------------------

    /// Replace the watched sports, clearing all per-sport state. Returns how
    /// many names were dropped as duplicates or past capacity.
    pub fn set_watched_sports<I, S>(&mut self, sports: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dropped = self.store.set_watched_sports(sports);
        if self.is_connected() {
            self.queue_registration();
        }
        dropped
    }

    pub fn set_school(&mut self, school: impl Into<String>) {
        self.school = school.into();
        if self.is_connected() {
            self.queue_registration();
        }
    }

    pub fn latest(&self, sport: &str) -> Option<&GameInfo> {
        self.store.latest(sport)
    }

    pub fn hours_since_last_win(&self, sport: &str) -> Option<u64> {
        self.hours_since_last_win_at(sport, self.clock.now_epoch())
    }

    pub fn hours_since_last_win_at(&self, sport: &str, now: i64) -> Option<u64> {
        self.store.hours_since_last_win(sport, now)
    }

    pub fn registration(&self) -> Registration<'_> {
        Registration {
            uid: &self.uid,
            school: &self.school,
            sports: self.store.sports(),
        }
    }

    fn queue_registration(&mut self) {
        match serde_json::to_string(&self.registration()) {
            Ok(text) => {
                info!(
                    "registering {} for {:?} in {} sports",
                    self.uid,
                    self.school,
                    self.store.len()
                );
                self.outbox.push_back(text);
            }
            Err(e) => error!("could not encode registration: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{FixedClock, epoch_from_utc};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    fn config() -> ClientConfig {
        ClientConfig {
            url: "ws://localhost:8000/ws/123456".into(),
            uid: "123456".into(),
            school: "Montana".into(),
            sports: vec!["Football".into(), "Basketball".into()],
            auth_token: Some("abc123".into()),
        }
    }

    fn client() -> SiotClient {
        SiotClient::new(config()).unwrap()
    }

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn starts_disconnected_with_nothing_to_send() {
        let mut c = client();
        assert_eq!(c.state(), ConnectionState::Disconnected);
        assert!(c.drain_outbound().is_empty());
        assert_eq!(c.endpoint().port, 8000);
        assert_eq!(c.auth_header().as_deref(), Some("Bearer abc123"));
    }

    #[test]
    fn rejects_bad_config() {
        let bad_url = ClientConfig { url: "localhost".into(), ..config() };
        assert!(matches!(SiotClient::new(bad_url), Err(ClientError::Endpoint(_))));
        let no_uid = ClientConfig { uid: " ".into(), ..config() };
        assert_eq!(SiotClient::new(no_uid).err(), Some(ClientError::MissingUid));
    }

    #[test]
    fn empty_token_sends_no_header() {
        let c = SiotClient::new(ClientConfig { auth_token: Some(String::new()), ..config() }).unwrap();
        assert_eq!(c.auth_header(), None);
    }

    #[test]
    fn connecting_sends_registration() {
        let mut c = client();
        c.handle_transport(TransportEvent::Connected);
        assert!(c.is_connected());

        let out = c.drain_outbound();
        assert_eq!(out.len(), 1);
        assert_eq!(
            parse(&out[0]),
            json!({"uid": "123456", "school": "Montana", "sports": ["Football", "Basketball"]})
        );
    }

    #[test]
    fn mutations_while_connected_reregister() {
        let mut c = client();
        c.handle_transport(TransportEvent::Connected);
        c.drain_outbound();

        c.set_school("Montana St.");
        c.set_watched_sports(["Soccer (W)"]);

        let out: Vec<Value> = c.drain_outbound().iter().map(|t| parse(t)).collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["school"], "Montana St.");
        assert_eq!(out[0]["sports"], json!(["Football", "Basketball"]));
        assert_eq!(out[1]["sports"], json!(["Soccer (W)"]));
    }

    #[test]
    fn same_values_are_still_resent() {
        let mut c = client();
        c.handle_transport(TransportEvent::Connected);
        c.drain_outbound();
        c.set_school("Montana");
        assert_eq!(c.drain_outbound().len(), 1);
    }

    #[test]
    fn mutations_while_disconnected_wait_for_the_next_connect() {
        let mut c = client();
        c.set_school("Idaho");
        c.set_watched_sports(["Volleyball (W)"]);
        assert!(c.drain_outbound().is_empty());

        c.handle_transport(TransportEvent::Connected);
        let out = c.drain_outbound();
        assert_eq!(out.len(), 1);
        assert_eq!(
            parse(&out[0]),
            json!({"uid": "123456", "school": "Idaho", "sports": ["Volleyball (W)"]})
        );
    }

    #[test]
    fn disconnect_discards_unsent_registrations() {
        let mut c = client();
        c.handle_transport(TransportEvent::Connected);
        c.handle_transport(TransportEvent::Disconnected);
        assert_eq!(c.state(), ConnectionState::Disconnected);
        assert!(c.drain_outbound().is_empty());

        c.handle_transport(TransportEvent::Connected);
        assert_eq!(c.drain_outbound().len(), 1);
    }

    #[test]
    fn text_frames_leave_the_state_alone() {
        assert_eq!(
            ConnectionState::Connected.next(&TransportEvent::Text("{}".into())),
            ConnectionState::Connected
        );
        assert_eq!(
            ConnectionState::Disconnected.next(&TransportEvent::Text("{}".into())),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn win_flows_through_observers_and_hours_query() {
        let now = epoch_from_utc(2024, 1, 1, 13, 0, 0);
        let mut c = client().with_clock(FixedClock(now));
        let wins = Arc::new(Mutex::new(Vec::new()));
        let updates = Arc::new(Mutex::new(0));
        let wins_seen = wins.clone();
        let updates_seen = updates.clone();
        c.on_win(move |g| wins_seen.lock().unwrap().push(g.id));
        c.on_update(move |_| *updates_seen.lock().unwrap() += 1);

        c.handle_transport(TransportEvent::Connected);
        let outcome = c.handle_transport(TransportEvent::Text(
            r#"{"id": 11, "sport": "Football", "winner": "Montana", "time": "2024-01-01T10:00:00Z"}"#
                .into(),
        ));

        assert_eq!(outcome, Some(Dispatch::Update));
        assert_eq!(*wins.lock().unwrap(), vec![11]);
        assert_eq!(*updates.lock().unwrap(), 1);
        assert_eq!(c.hours_since_last_win("Football"), Some(3));
        assert_eq!(c.hours_since_last_win("Basketball"), None);
        assert_eq!(c.latest("Football").map(|g| g.id), Some(11));
    }

    #[test]
    fn init_observer_fires_once_per_snapshot() {
        let mut c = client();
        let counts = Arc::new(Mutex::new(Vec::new()));
        let counts_seen = counts.clone();
        c.on_init(move |n| counts_seen.lock().unwrap().push(n));

        c.handle_text(
            r#"{"init": true, "games": [{"sport": "Football"}, {"sport": "Basketball"}, {"sport": "Golf"}]}"#,
        );

        assert_eq!(*counts.lock().unwrap(), vec![3]);
        assert!(c.latest("Football").is_some());
        assert!(c.latest("Basketball").is_some());
        assert!(c.latest("Golf").is_none());
    }

    #[test]
    fn replacing_sports_forgets_previous_state() {
        let mut c = client();
        c.handle_text(r#"{"id": 1, "sport": "Football"}"#);
        assert!(c.latest("Football").is_some());

        c.set_watched_sports(["soccer"]);
        assert!(c.latest("Football").is_none());
        assert_eq!(c.watched_sports(), ["soccer".to_string()]);
    }

    #[test]
    fn unsynchronized_clock_reports_unknown() {
        let mut c = client().with_clock(FixedClock(0));
        c.handle_text(r#"{"sport": "Football", "winner": "Montana", "date": "2024-01-01"}"#);
        assert_eq!(c.hours_since_last_win("Football"), None);
        assert_eq!(c.hours_since_last_win_at("Football", epoch_from_utc(2024, 1, 2, 0, 0, 0)), Some(24));
    }
}
