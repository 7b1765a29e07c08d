//! Calendar dates without a time-of-day component.
//!
//! Stored as `YYYY-MM-DD` so lexical order matches chronological order and
//! nothing about time zones or locale ends up persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, StreakError};

const STORAGE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Build from a (year, month, day) triple, rejecting impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| StreakError::MalformedDate {
                input: format!("{year:04}-{month:02}-{day:02}"),
            })
    }

    /// Parse the storage form. Only the exact `YYYY-MM-DD` shape is accepted.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let malformed = || StreakError::MalformedDate {
            input: input.to_string(),
        };

        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !shape_ok {
            return Err(malformed());
        }

        NaiveDate::parse_from_str(s, STORAGE_FORMAT)
            .map(Self)
            .map_err(|_| malformed())
    }

    /// The host's current local calendar date.
    pub fn today_local() -> Self {
        Self(Local::now().date_naive())
    }

    /// Whole days from `self` to `later`; negative when `later` is earlier.
    ///
    /// Both ends are plain calendar dates, so DST transitions cannot shift
    /// the result.
    pub fn days_until(&self, later: CalendarDate) -> i64 {
        (later.0 - self.0).num_days()
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Human form used in status output, e.g. "Jan 5, 2024".
    pub fn pretty(&self) -> String {
        self.0.format("%b %-d, %Y").to_string()
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(d: NaiveDate) -> Self {
        Self(d)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(STORAGE_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = StreakError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
