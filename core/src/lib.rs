pub mod calendar;
pub mod client;
pub mod dispatch;
pub mod endpoint;
pub mod events;
pub mod notifier;
pub mod store;
pub mod wire;

use serde::Serialize;

pub use calendar::{Clock, DateParts, FixedClock, SystemClock};
pub use client::{ClientConfig, ClientError, ConnectionState, SiotClient, TransportEvent};
pub use endpoint::{Endpoint, EndpointError};
pub use events::{ClientEvent, EventSink, Observers};
pub use store::SportStore;

/// Upper bound on the number of sports one client tracks.
pub const MAX_SPORTS: usize = 8;

// ---------------------------------------------------------------------------
// Domain types, independent of the wire format
// ---------------------------------------------------------------------------

/// One game as last reported by the scoring service.
///
/// Records are replaced wholesale when a newer one for the same sport
/// arrives; nothing mutates a stored record in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    pub id: i64, // -1 when the service sent none
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub winner: String, // empty until the game is final
    pub home_score: i64,
    pub away_score: i64,
    pub date: String,
    pub time: Option<String>,
}

impl Default for GameInfo {
    fn default() -> Self {
        Self {
            id: -1,
            sport: String::new(),
            home_team: String::new(),
            away_team: String::new(),
            winner: String::new(),
            home_score: -1,
            away_score: -1,
            date: String::new(),
            time: None,
        }
    }
}

impl GameInfo {
    pub fn is_final(&self) -> bool {
        !self.winner.is_empty()
    }

    pub fn has_score(&self) -> bool {
        self.home_score >= 0 && self.away_score >= 0
    }

    /// True when the given team is the recorded winner.
    pub fn won_by(&self, team: &str) -> bool {
        self.is_final() && self.winner == team
    }
}

/// Registration payload: `{"uid": ..., "school": ..., "sports": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration<'a> {
    pub uid: &'a str,
    pub school: &'a str,
    pub sports: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_game_uses_unset_sentinels() {
        let g = GameInfo::default();
        assert_eq!(g.id, -1);
        assert_eq!(g.home_score, -1);
        assert_eq!(g.away_score, -1);
        assert!(g.time.is_none());
        assert!(!g.is_final());
        assert!(!g.has_score());
    }

    #[test]
    fn won_by_requires_a_non_empty_winner() {
        let g = GameInfo { winner: "Montana".into(), ..Default::default() };
        assert!(g.won_by("Montana"));
        assert!(!g.won_by("Idaho"));
        assert!(!GameInfo::default().won_by(""));
    }

    #[test]
    fn registration_serializes_in_wire_shape() {
        let sports = vec!["Football".to_string(), "Soccer (W)".to_string()];
        let reg = Registration { uid: "123456", school: "Montana", sports: &sports };
        let text = serde_json::to_string(&reg).unwrap();
        assert_eq!(
            text,
            r#"{"uid":"123456","school":"Montana","sports":["Football","Soccer (W)"]}"#
        );
    }
}
