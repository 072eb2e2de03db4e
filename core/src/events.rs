use crate::GameInfo;

/// Receives what the dispatcher learns from each inbound frame.
///
/// Calls are synchronous and in arrival order. They happen while the client
/// is mutably borrowed, so a sink cannot reach back into the client; anything
/// that wants to change the watched sports or team in response to an event
/// has to queue that change for the next turn of the driving loop.
pub trait EventSink {
    /// An init snapshot finished; `count` records were routed.
    fn on_init(&mut self, _count: usize) {}

    /// A game record was routed, watched or not.
    fn on_update(&mut self, _game: &GameInfo) {}

    /// The monitored team won a game in a watched sport.
    fn on_win(&mut self, _game: &GameInfo) {}
}

/// Owned copy of one sink call, for consumers that prefer values to callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Init { count: usize },
    Update(GameInfo),
    Win(GameInfo),
}

impl EventSink for Vec<ClientEvent> {
    fn on_init(&mut self, count: usize) {
        self.push(ClientEvent::Init { count });
    }

    fn on_update(&mut self, game: &GameInfo) {
        self.push(ClientEvent::Update(game.clone()));
    }

    fn on_win(&mut self, game: &GameInfo) {
        self.push(ClientEvent::Win(game.clone()));
    }
}

pub type InitCallback = Box<dyn FnMut(usize) + Send>;
pub type UpdateCallback = Box<dyn FnMut(&GameInfo) + Send>;
pub type WinCallback = Box<dyn FnMut(&GameInfo) + Send>;

/// The three application callbacks. Unset callbacks are skipped.
#[derive(Default)]
pub struct Observers {
    pub on_init: Option<InitCallback>,
    pub on_update: Option<UpdateCallback>,
    pub on_win: Option<WinCallback>,
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("on_init", &self.on_init.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_win", &self.on_win.is_some())
            .finish()
    }
}

impl EventSink for Observers {
    fn on_init(&mut self, count: usize) {
        if let Some(cb) = self.on_init.as_mut() {
            cb(count);
        }
    }

    fn on_update(&mut self, game: &GameInfo) {
        if let Some(cb) = self.on_update.as_mut() {
            cb(game);
        }
    }

    fn on_win(&mut self, game: &GameInfo) {
        if let Some(cb) = self.on_win.as_mut() {
            cb(game);
        }
    }
}
