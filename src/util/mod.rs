//! Utilities. OBVIOUSLY.

use chrono::NaiveDate;
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

pub mod ser;

/// The format every calendar date goes over the wire in.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A library-local calendar date (no time, no zone).
///
/// Why wrap `NaiveDate`? Dates have exactly one wire representation here
/// (ISO-8601 `YYYY-MM-DD` text) and it has to be identical to what every other
/// implementation emits, so the formatting lives in one place. Anything that
/// takes a `Date` will also take a [NaiveDate] via `From/Into`, and you can
/// always get the underlying type back via deref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date(NaiveDate);

impl Date {
    /// Build a date from year/month/day, returning `None` for impossible
    /// dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The ISO-8601 representation.
    pub fn to_iso(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }
}

impl Deref for Date {
    type Target = NaiveDate;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for Date {
    type Err = chrono::format::ParseError;
    fn from_str(s: &str) -> std::result::Result<Date, Self::Err> {
        Ok(Date(NaiveDate::parse_from_str(s, DATE_FORMAT)?))
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_iso())
    }
}
