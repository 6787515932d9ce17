//! Frame timestamps
//!
//! A [`Timestamp`] is a wall-clock instant with microsecond resolution,
//! rendered as `<seconds since Unix epoch>.<6-digit microseconds>`.
//! The generator reads time through a [`Clock`], which is either the real
//! wall clock or a stepped simulation clock for reproducible datasets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MICROS_PER_SEC: u64 = 1_000_000;

/// Error returned when a timestamp string is not `<integer>.<6 digits>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid timestamp {0:?}: expected <seconds>.<6 digits>")]
pub struct InvalidTimestamp(pub String);

/// Seconds since the Unix epoch plus a microsecond fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    secs: i64,
    micros: u32,
}

impl Timestamp {
    /// Create a timestamp. `micros` is clamped to `0..=999_999`.
    pub fn new(secs: i64, micros: u32) -> Self {
        Self {
            secs,
            micros: micros.min(MICROS_PER_SEC as u32 - 1),
        }
    }

    /// Sample the wall clock.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Seconds and microseconds taken from the same instant.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        // chrono reports leap seconds as micros >= 1_000_000; `new` clamps them
        Self::new(dt.timestamp(), dt.timestamp_subsec_micros())
    }

    /// Convert back to a chrono instant.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.secs, self.micros * 1_000)
    }

    /// Whole seconds since the epoch.
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// Microsecond fraction.
    pub fn subsec_micros(&self) -> u32 {
        self.micros
    }

    /// Advance by a number of microseconds.
    pub fn add_micros(self, micros: u64) -> Self {
        let total = self.micros as u64 + micros;
        let secs = self
            .secs
            .saturating_add((total / MICROS_PER_SEC).min(i64::MAX as u64) as i64);
        Self {
            secs,
            micros: (total % MICROS_PER_SEC) as u32,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

impl FromStr for Timestamp {
    type Err = InvalidTimestamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTimestamp(s.to_string());

        let (secs, frac) = s.split_once('.').ok_or_else(invalid)?;
        // seconds before the epoch keep their sign, as Display writes them
        let unsigned = secs.strip_prefix('-').unwrap_or(secs);
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(unsigned) || !all_digits(frac) || frac.len() != 6 {
            return Err(invalid());
        }

        let secs = secs.parse().map_err(|_| invalid())?;
        let micros = frac.parse().map_err(|_| invalid())?;
        Ok(Self { secs, micros })
    }
}

impl TryFrom<String> for Timestamp {
    type Error = InvalidTimestamp;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_string()
    }
}

/// How frame timestamps are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Timing {
    /// Stamp each frame with the current wall-clock time.
    #[default]
    WallClock,
    /// Start at `start` and advance by `interval_micros` per frame.
    Fixed { start: Timestamp, interval_micros: u64 },
}

/// Time source used while generating a run.
#[derive(Debug, Clone)]
pub enum Clock {
    /// Wall clock. Never returns a value earlier than the previous one.
    System { last: Option<Timestamp> },
    /// Simulated clock advancing by a fixed step on every read.
    Stepped { next: Timestamp, step_micros: u64 },
}

impl Clock {
    /// Wall-clock source.
    pub fn system() -> Self {
        Clock::System { last: None }
    }

    /// Simulated source starting at `start`.
    pub fn stepped(start: Timestamp, step_micros: u64) -> Self {
        Clock::Stepped {
            next: start,
            step_micros,
        }
    }

    /// Read the current time.
    pub fn now(&mut self) -> Timestamp {
        match self {
            Clock::System { last } => {
                let sampled = Timestamp::now();
                let ts = match *last {
                    Some(prev) if prev > sampled => prev,
                    _ => sampled,
                };
                *last = Some(ts);
                ts
            }
            Clock::Stepped { next, step_micros } => {
                let ts = *next;
                *next = ts.add_micros(*step_micros);
                ts
            }
        }
    }
}

impl From<Timing> for Clock {
    fn from(timing: Timing) -> Self {
        match timing {
            Timing::WallClock => Clock::system(),
            Timing::Fixed {
                start,
                interval_micros,
            } => Clock::stepped(start, interval_micros),
        }
    }
}
