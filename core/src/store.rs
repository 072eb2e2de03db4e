use crate::calendar::hours_since;
use crate::{GameInfo, MAX_SPORTS};
use log::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SportSlot {
    latest: Option<GameInfo>,
    last_win_epoch: Option<i64>,
}

/// Latest game and last win per watched sport.
///
/// Slot `i` always belongs to `sports[i]`. Both vectors are replaced together
/// and never grow past [`MAX_SPORTS`].
#[derive(Debug, Clone, Default)]
pub struct SportStore {
    sports: Vec<String>,
    slots: Vec<SportSlot>,
}

impl SportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the watched list and clear every slot.
    ///
    /// Repeated names keep their first position. Names past capacity are
    /// dropped; the return value is how many names were discarded.
    pub fn set_watched_sports<I, S>(&mut self, sports: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut accepted: Vec<String> = Vec::with_capacity(MAX_SPORTS);
        let mut dropped = 0;
        for sport in sports {
            let sport = sport.into();
            if accepted.contains(&sport) {
                dropped += 1;
            } else if accepted.len() == MAX_SPORTS {
                warn!("watched sport list full ({MAX_SPORTS}), dropping {sport:?}");
                dropped += 1;
            } else {
                accepted.push(sport);
            }
        }

        self.slots = vec![SportSlot::default(); accepted.len()];
        self.sports = accepted;
        dropped
    }

    pub fn sports(&self) -> &[String] {
        &self.sports
    }

    pub fn len(&self) -> usize {
        self.sports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sports.is_empty()
    }

    /// Linear scan; the list never holds more than [`MAX_SPORTS`] names.
    pub fn lookup_index(&self, sport: &str) -> Option<usize> {
        self.sports.iter().position(|s| s == sport)
    }

    pub fn latest(&self, sport: &str) -> Option<&GameInfo> {
        let idx = self.lookup_index(sport)?;
        self.slots[idx].latest.as_ref()
    }

    /// Store `info` in its sport's slot. Returns the slot index, or `None`
    /// when the sport is not watched and nothing was stored.
    pub fn record_update(&mut self, info: &GameInfo) -> Option<usize> {
        let idx = self.lookup_index(&info.sport)?;
        self.slots[idx].latest = Some(info.clone());
        Some(idx)
    }

    /// Overwrite the last-win epoch of slot `idx`. No ordering check: the most
    /// recently reported win replaces whatever was there.
    pub fn record_win(&mut self, idx: usize, epoch: i64) {
        if let Some(slot) = self.slots.get_mut(idx) {
            slot.last_win_epoch = Some(epoch);
        }
    }

    pub fn last_win_epoch(&self, sport: &str) -> Option<i64> {
        let idx = self.lookup_index(sport)?;
        self.slots[idx].last_win_epoch
    }

    /// Whole hours since the monitored team last won `sport`, measured at `now`.
    pub fn hours_since_last_win(&self, sport: &str, now: i64) -> Option<u64> {
        hours_since(now, self.last_win_epoch(sport)?)
    }
}
