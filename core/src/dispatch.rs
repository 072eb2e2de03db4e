use crate::calendar::{DateParts, parse_timestamp};
use crate::events::EventSink;
use crate::store::SportStore;
use crate::wire::WireGame;
use crate::GameInfo;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

/// What one inbound frame turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// `{"init": true, "games": [...]}`; `count` records were routed.
    Init { count: usize },
    /// A single game record.
    Update,
    /// Not JSON, not an object, or a shape we do not handle.
    Ignored,
}

/// Classify a text frame and route the game records it carries.
///
/// Malformed frames are dropped silently: no sink call, no state change.
pub fn dispatch_text(
    payload: &str,
    store: &mut SportStore,
    team: &str,
    sink: &mut dyn EventSink,
) -> Dispatch {
    let doc: Value = match serde_json::from_str(payload) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("dropping non-JSON frame: {e}");
            return Dispatch::Ignored;
        }
    };

    let Some(fields) = doc.as_object() else {
        debug!("dropping non-object frame");
        return Dispatch::Ignored;
    };

    if fields.get("init").and_then(Value::as_bool) == Some(true) {
        let mut count = 0;
        for raw in fields.get("games").and_then(Value::as_array).into_iter().flatten() {
            if route_value(raw, store, team, sink) {
                count += 1;
            }
        }
        debug!("init snapshot routed {count} games");
        sink.on_init(count);
        return Dispatch::Init { count };
    }

    if let Some(err) = fields.get("error") {
        warn!("scoring service reported an error: {err}");
        return Dispatch::Ignored;
    }

    if route_value(&doc, store, team, sink) {
        Dispatch::Update
    } else {
        Dispatch::Ignored
    }
}

fn route_value(raw: &Value, store: &mut SportStore, team: &str, sink: &mut dyn EventSink) -> bool {
    if !raw.is_object() {
        debug!("skipping non-object game record");
        return false;
    }
    match WireGame::deserialize(raw) {
        Ok(wire) => {
            route_game(wire.into_game(), store, team, sink);
            true
        }
        Err(e) => {
            debug!("skipping game record: {e}");
            false
        }
    }
}

/// Store one record, announce it, and track the win if it is one of ours.
pub fn route_game(game: GameInfo, store: &mut SportStore, team: &str, sink: &mut dyn EventSink) {
    let slot = store.record_update(&game);
    sink.on_update(&game);

    if slot.is_none() {
        debug!("not watching {:?}; game {} not stored", game.sport, game.id);
    }

    if !game.won_by(team) {
        return;
    }

    // Only watched sports have a slot to time the win against.
    if let Some(idx) = slot {
        match win_epoch(&game) {
            Some(epoch) => store.record_win(idx, epoch),
            None => warn!(
                "{} won {} game {} but neither time {:?} nor date {:?} gives a usable timestamp",
                game.winner, game.sport, game.id, game.time, game.date
            ),
        }
    }
    sink.on_win(&game);
}

/// When the game ended: its `time` if that parses, else midnight UTC of its `date`.
pub fn win_epoch(game: &GameInfo) -> Option<i64> {
    let parts = game
        .time
        .as_deref()
        .and_then(|t| parse_timestamp(t).ok())
        .or_else(|| parse_timestamp(&game.date).ok().map(DateParts::at_midnight))?;
    Some(parts.epoch()).filter(|epoch| *epoch > 0)
}
