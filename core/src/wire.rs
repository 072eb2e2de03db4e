//! Serde shapes for inbound scoring service frames.
//! Every field is optional on the wire, and a field of the wrong JSON type
//! reads as absent. `into_game` fills in the unset sentinels.

use crate::GameInfo;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Game record
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireGame {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sport: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub home_team: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub away_team: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub winner: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<WireScore>,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct WireScore {
    #[serde(default, deserialize_with = "lenient")]
    pub home: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub away: Option<i64>,
}

/// Any JSON value; `None` unless it decodes as `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl WireGame {
    pub fn into_game(self) -> GameInfo {
        let score = self.score.unwrap_or_default();
        GameInfo {
            id: self.id.unwrap_or(-1),
            sport: self.sport.unwrap_or_default(),
            home_team: self.home_team.unwrap_or_default(),
            away_team: self.away_team.unwrap_or_default(),
            winner: self.winner.unwrap_or_default(),
            home_score: score.home.unwrap_or(-1),
            away_score: score.away.unwrap_or(-1),
            date: self.date.unwrap_or_default(),
            time: self.time.filter(|t| !t.is_empty()),
        }
    }
}
