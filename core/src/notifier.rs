//! Mirrors monitored-team wins into the legacy status CGI.
//!
//! The CGI only understands short school codes, so winners are looked up in a
//! team map first. Each (sports day, winner, sport) is posted at most once per
//! process; a sports day rolls over at 03:00 UTC.

use crate::GameInfo;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

const USER_AGENT: &str = "SIOT-Legacy-Notifier/1.0";
const SPORTS_DAY_OFFSET_HOURS: i64 = 3;

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Debug)]
pub enum NotifyError {
    Network(reqwest::Error, String),
    Status(reqwest::Error, String),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            NotifyError::Status(e, url) => write!(f, "CGI rejected update at {url}: {e}"),
        }
    }
}

impl std::error::Error for NotifyError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Posted { code: String },
    /// Not our team, or not a sport we watch.
    Ignored,
    AlreadyPosted,
    Unmapped,
}

#[derive(Debug, Serialize)]
struct StatusUpdate<'a> {
    school: &'a str,
    sport: &'a str,
    status: u8,
}

pub fn default_team_map() -> HashMap<String, String> {
    [("Utah St.", "usu"), ("Washington St.", "wsu"), ("SFA", "debugschool")]
        .into_iter()
        .map(|(team, code)| (team.to_owned(), code.to_owned()))
        .collect()
}

/// Team map from a JSON object of team name to school code. Missing or
/// malformed input yields [`default_team_map`].
pub fn team_map_from_json(raw: Option<&str>) -> HashMap<String, String> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return default_team_map();
    };
    match serde_json::from_str::<HashMap<String, String>>(raw) {
        Ok(map) => map,
        Err(e) => {
            warn!("invalid team map json, using built-in map: {e}");
            default_team_map()
        }
    }
}

/// Calendar day a result counts toward: games ending before 03:00 UTC belong
/// to the previous day.
pub fn sports_day(now: DateTime<Utc>) -> NaiveDate {
    (now - TimeDelta::hours(SPORTS_DAY_OFFSET_HOURS)).date_naive()
}

fn posted_key(day: NaiveDate, winner: &str, sport: &str) -> String {
    format!("{day}|{winner}|{sport}")
}

#[derive(Debug, Clone)]
pub struct LegacyNotifier {
    client: Client,
    url: String,
    school: String,
    sports: Vec<String>,
    team_map: HashMap<String, String>,
    posted: HashSet<String>,
    timeout: Duration,
}

impl LegacyNotifier {
    pub fn new(
        url: impl Into<String>,
        school: impl Into<String>,
        sports: Vec<String>,
        team_map: HashMap<String, String>,
    ) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
            url: url.into(),
            school: school.into(),
            sports,
            team_map,
            posted: HashSet::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post the win in `game` unless it was already posted for this sports day.
    ///
    /// Only a 2xx answer marks the win as posted, so a failed post is retried
    /// on the next call.
    pub async fn notify_win(
        &mut self,
        game: &GameInfo,
        now: DateTime<Utc>,
    ) -> NotifyResult<NotifyOutcome> {
        if !game.won_by(&self.school) || !self.sports.contains(&game.sport) {
            return Ok(NotifyOutcome::Ignored);
        }

        let key = posted_key(sports_day(now), &game.winner, &game.sport);
        if self.posted.contains(&key) {
            debug!("already posted today for {} ({}); skipping", game.winner, game.sport);
            return Ok(NotifyOutcome::AlreadyPosted);
        }

        let Some(code) = self.team_map.get(&game.winner).cloned() else {
            info!("no CGI mapping for winner {:?}; skipping", game.winner);
            return Ok(NotifyOutcome::Unmapped);
        };

        self.post_status(&code, &game.sport, 1).await?;
        info!("posted {} win in {} as {code}", game.winner, game.sport);
        self.posted.insert(key);
        Ok(NotifyOutcome::Posted { code })
    }

    async fn post_status(&self, code: &str, sport: &str, status: u8) -> NotifyResult<()> {
        let body = StatusUpdate { school: code, sport, status };
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e, self.url.clone()))?;

        response
            .error_for_status()
            .map(|_| ())
            .map_err(|e| NotifyError::Status(e, self.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;
    use serde_json::json;

    fn win(sport: &str, winner: &str) -> GameInfo {
        GameInfo {
            id: 1,
            sport: sport.into(),
            winner: winner.into(),
            ..Default::default()
        }
    }

    fn notifier(url: String) -> LegacyNotifier {
        LegacyNotifier::new(
            url,
            "Utah St.",
            vec!["Soccer (W)".into(), "Volleyball (W)".into()],
            default_team_map(),
        )
    }

    #[test]
    fn sports_day_rolls_over_at_three_am() {
        let before = Utc.with_ymd_and_hms(2024, 10, 5, 2, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 10, 5, 3, 0, 0).unwrap();
        assert_eq!(sports_day(before), NaiveDate::from_ymd_opt(2024, 10, 4).unwrap());
        assert_eq!(sports_day(after), NaiveDate::from_ymd_opt(2024, 10, 5).unwrap());
    }

    #[test]
    fn posted_key_format() {
        let day = NaiveDate::from_ymd_opt(2024, 10, 4).unwrap();
        assert_eq!(posted_key(day, "Utah St.", "Soccer (W)"), "2024-10-04|Utah St.|Soccer (W)");
    }

    #[test]
    fn team_map_json_overrides_and_falls_back() {
        let custom = team_map_from_json(Some(r#"{"Montana": "umt"}"#));
        assert_eq!(custom.get("Montana").map(String::as_str), Some("umt"));
        assert!(!custom.contains_key("Utah St."));

        assert_eq!(team_map_from_json(None), default_team_map());
        assert_eq!(team_map_from_json(Some("  ")), default_team_map());
        assert_eq!(team_map_from_json(Some("[1, 2]")), default_team_map());
    }

    #[tokio::test]
    async fn posts_once_per_sports_day() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/update")
            .match_header("user-agent", USER_AGENT)
            .match_body(Matcher::Json(json!({"school": "usu", "sport": "Soccer (W)", "status": 1})))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let mut n = notifier(format!("{}/update", server.url()));
        let now = Utc.with_ymd_and_hms(2024, 10, 5, 20, 0, 0).unwrap();
        let game = win("Soccer (W)", "Utah St.");

        assert_eq!(
            n.notify_win(&game, now).await.unwrap(),
            NotifyOutcome::Posted { code: "usu".into() }
        );
        assert_eq!(n.notify_win(&game, now).await.unwrap(), NotifyOutcome::AlreadyPosted);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn new_sports_day_posts_again() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/update")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let mut n = notifier(format!("{}/update", server.url()));
        let game = win("Volleyball (W)", "Utah St.");
        let day_one = Utc.with_ymd_and_hms(2024, 10, 5, 20, 0, 0).unwrap();
        let day_two = Utc.with_ymd_and_hms(2024, 10, 6, 20, 0, 0).unwrap();

        assert!(matches!(n.notify_win(&game, day_one).await, Ok(NotifyOutcome::Posted { .. })));
        assert!(matches!(n.notify_win(&game, day_two).await, Ok(NotifyOutcome::Posted { .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_post_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/update")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let mut n = notifier(format!("{}/update", server.url()));
        let game = win("Soccer (W)", "Utah St.");
        let now = Utc.with_ymd_and_hms(2024, 10, 5, 20, 0, 0).unwrap();

        assert!(matches!(n.notify_win(&game, now).await, Err(NotifyError::Status(..))));
        failing.assert_async().await;
        failing.remove_async().await;

        let ok = server.mock("POST", "/update").with_status(200).create_async().await;
        assert!(matches!(n.notify_win(&game, now).await, Ok(NotifyOutcome::Posted { .. })));
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn skips_other_teams_unwatched_sports_and_unmapped_winners() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/update").expect(0).create_async().await;

        let url = format!("{}/update", server.url());
        let now = Utc.with_ymd_and_hms(2024, 10, 5, 20, 0, 0).unwrap();

        let mut n = notifier(url.clone());
        assert_eq!(
            n.notify_win(&win("Soccer (W)", "Weber St."), now).await.unwrap(),
            NotifyOutcome::Ignored
        );
        assert_eq!(
            n.notify_win(&win("Football", "Utah St."), now).await.unwrap(),
            NotifyOutcome::Ignored
        );

        let mut unmapped = LegacyNotifier::new(url, "Montana", vec!["Soccer (W)".into()], default_team_map());
        assert_eq!(
            unmapped.notify_win(&win("Soccer (W)", "Montana"), now).await.unwrap(),
            NotifyOutcome::Unmapped
        );
        mock.assert_async().await;
    }
}
