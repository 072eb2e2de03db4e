use crate::app::MenuItem;
use chrono::Local;
use siot_core::GameInfo;
use std::collections::VecDeque;

const FEED_CAPACITY: usize = 200;

// ---------------------------------------------------------------------------
// Update feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Init,
    Update,
    Win,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub timestamp: String,
    pub kind: FeedKind,
    pub text: String,
}

/// Newest-last log of everything the client reported, capped at `FEED_CAPACITY`.
#[derive(Debug, Default)]
pub struct FeedState {
    pub entries: VecDeque<FeedEntry>,
    pub scroll_offset: u16,
}

impl FeedState {
    pub fn push(&mut self, kind: FeedKind, text: impl Into<String>) {
        if self.entries.len() == FEED_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(FeedEntry {
            timestamp: Local::now().format("%H:%M").to_string(),
            kind,
            text: text.into(),
        });
    }

    pub fn push_game(&mut self, kind: FeedKind, game: &GameInfo) {
        self.push(kind, describe_game(game));
    }

    pub fn scroll_up(&mut self) {
        let max = self.entries.len().saturating_sub(1) as u16;
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }
}

/// One-line summary: `[Football] Montana 21 - 14 Idaho (Montana won)`.
pub fn describe_game(game: &GameInfo) -> String {
    let score = if game.has_score() {
        format!(" {} - {} ", game.home_score, game.away_score)
    } else {
        " vs ".to_string()
    };
    let result = if game.is_final() {
        format!(" ({} won)", game.winner)
    } else {
        String::new()
    };
    format!("[{}] {}{}{}{}", game.sport, game.home_team, score, game.away_team, result)
}

// ---------------------------------------------------------------------------
// Root state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub selected_sport: usize,
    pub feed: FeedState,
    pub last_init_count: Option<usize>,
    pub last_error: Option<String>,
    pub show_logs: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_next(&mut self, sport_count: usize) {
        if self.selected_sport + 1 < sport_count {
            self.selected_sport += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_sport = self.selected_sport.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_drops_oldest_past_capacity() {
        let mut feed = FeedState::default();
        for i in 0..FEED_CAPACITY + 5 {
            feed.push(FeedKind::System, format!("line {i}"));
        }
        assert_eq!(feed.entries.len(), FEED_CAPACITY);
        assert_eq!(feed.entries.front().map(|e| e.text.as_str()), Some("line 5"));
    }

    #[test]
    fn describe_game_with_and_without_score() {
        let mut game = GameInfo {
            sport: "Football".into(),
            home_team: "Montana".into(),
            away_team: "Idaho".into(),
            ..Default::default()
        };
        assert_eq!(describe_game(&game), "[Football] Montana vs Idaho");

        game.home_score = 21;
        game.away_score = 14;
        game.winner = "Montana".into();
        assert_eq!(describe_game(&game), "[Football] Montana 21 - 14 Idaho (Montana won)");
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut state = AppState::new();
        state.select_prev();
        assert_eq!(state.selected_sport, 0);
        state.select_next(2);
        state.select_next(2);
        assert_eq!(state.selected_sport, 1);
    }
}
