//! Calendar arithmetic for win timestamps.
//!
//! Proleptic Gregorian, UTC only, no date library. Results are only ever
//! compared with each other and with the host clock.

use std::fmt;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const MIN_TIMESTAMP_LEN: usize = 10;
const MIN_DATETIME_LEN: usize = 19;
const MONTH_DAYS: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Calendar fields read out of a timestamp string. Always UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl DateParts {
    pub fn epoch(&self) -> i64 {
        epoch_from_utc(self.year, self.month, self.day, self.hour, self.minute, self.second)
    }

    /// Same calendar day at 00:00:00.
    pub fn at_midnight(self) -> Self {
        Self { hour: 0, minute: 0, second: 0, ..self }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    TooShort(usize),
    OutOfRange(DateParts),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::TooShort(len) => {
                write!(f, "timestamp too short: {len} bytes, need at least {MIN_TIMESTAMP_LEN}")
            }
            TimestampError::OutOfRange(p) => {
                write!(f, "date out of range: year {} month {} day {}", p.year, p.month, p.day)
            }
        }
    }
}

impl std::error::Error for TimestampError {}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[Z]` or the same with a space
/// separator.
///
/// Anything after the seconds (a `Z`, an offset, fractions) is ignored and the
/// value is taken as UTC. The time of day is read only when the input is at
/// least 19 bytes long and byte 10 is `T` or a space; otherwise it is midnight.
/// Only the date is range-checked: year after 1970, month 1-12, day 1-31.
pub fn parse_timestamp(text: &str) -> Result<DateParts, TimestampError> {
    let bytes = text.as_bytes();
    if bytes.len() < MIN_TIMESTAMP_LEN {
        return Err(TimestampError::TooShort(bytes.len()));
    }

    let mut parts = DateParts {
        year: leading_int(bytes, 0, 4) as i32,
        month: leading_int(bytes, 5, 7),
        day: leading_int(bytes, 8, 10),
        ..Default::default()
    };

    if bytes.len() >= MIN_DATETIME_LEN && matches!(bytes[10], b'T' | b' ') {
        parts.hour = leading_int(bytes, 11, 13);
        parts.minute = leading_int(bytes, 14, 16);
        parts.second = leading_int(bytes, 17, 19);
    }

    if parts.year > 1970 && (1..=12).contains(&parts.month) && (1..=31).contains(&parts.day) {
        Ok(parts)
    } else {
        Err(TimestampError::OutOfRange(parts))
    }
}

/// Value of the ASCII digits at the start of `bytes[start..end]`; 0 when there are none.
fn leading_int(bytes: &[u8], start: usize, end: usize) -> u32 {
    bytes
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_year(year: i32) -> i64 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Seconds since 1970-01-01T00:00:00Z. No leap seconds, no time zones.
///
/// Months past December are clamped; day and time fields are taken as-is.
pub fn epoch_from_utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> i64 {
    let mut days: i64 = if year >= 1970 {
        (1970..year).map(days_in_year).sum::<i64>()
    } else {
        -(year..1970).map(days_in_year).sum::<i64>()
    };

    let whole_months = month.saturating_sub(1).min(12) as usize;
    days += MONTH_DAYS
        .iter()
        .take(whole_months)
        .enumerate()
        .map(|(i, d)| if i == 1 && is_leap_year(year) { 29 } else { *d })
        .sum::<i64>();

    days += i64::from(day) - 1;

    days * SECS_PER_DAY
        + i64::from(hour) * SECS_PER_HOUR
        + i64::from(minute) * 60
        + i64::from(second)
}

/// Whole hours from `event` to `now`, or `None` while either value is
/// non-positive (host clock not synchronized yet, or no event recorded).
///
/// A `now` earlier than `event` reads as zero hours.
pub fn hours_since(now: i64, event: i64) -> Option<u64> {
    if now <= 0 || event <= 0 {
        return None;
    }
    let delta = (now - event).max(0);
    Some((delta / SECS_PER_HOUR) as u64)
}

// ---------------------------------------------------------------------------
// Clock source
// ---------------------------------------------------------------------------

/// Current time as epoch seconds. The host is expected to keep it in UTC.
pub trait Clock: Send {
    fn now_epoch(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock that never moves. Used for replays and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_epoch(&self) -> i64 {
        self.0
    }
}
