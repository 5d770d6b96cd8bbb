//! Calendar-day keys and the normalizer that produces them.
//!
//! Every activity source reports dates differently (GitHub sends `YYYY-MM-DD`, LeetCode
//! sends epoch seconds, the entry store holds timestamps). All of them are folded into a
//! [`DateKey`], which is rendered from the *local* calendar fields of the configured zone so
//! a late-evening timestamp stays on the day the user experienced it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AppError, AppResult};

static DATE_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date key pattern"));

const KEY_FORMAT: &str = "%Y-%m-%d";

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y.%m.%d"];

/// A valid calendar day rendered as zero-padded `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Strict parse of an already-canonical key. Rejects impossible days like `2024-02-30`.
    pub fn parse(value: &str) -> Option<Self> {
        if !DATE_KEY_PATTERN.is_match(value) {
            return None;
        }
        NaiveDate::parse_from_str(value, KEY_FORMAT).ok().map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn previous(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    /// Whole days from `earlier` to `self`.
    pub fn days_since(&self, earlier: &DateKey) -> i64 {
        (self.0 - earlier.0).num_days()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DateKey::parse(value).ok_or_else(|| AppError::parse(format!("invalid date key: {value}")))
    }
}

impl From<NaiveDate> for DateKey {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateKey::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date key: {raw}")))
    }
}

/// The calendar whose year/month/day fields define "the user's day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarZone {
    /// Timezone of the running process.
    #[default]
    Local,
    Named(Tz),
}

impl CalendarZone {
    pub fn from_name(name: &str) -> AppResult<Self> {
        name.trim()
            .parse::<Tz>()
            .map(CalendarZone::Named)
            .map_err(|err| AppError::configuration(format!("unknown timezone {name}: {err}")))
    }

    /// Local calendar day on which `instant` falls.
    pub fn date_of<Z: TimeZone>(&self, instant: &DateTime<Z>) -> NaiveDate {
        let utc = instant.with_timezone(&Utc);
        match self {
            CalendarZone::Local => utc.with_timezone(&Local).date_naive(),
            CalendarZone::Named(tz) => utc.with_timezone(tz).date_naive(),
        }
    }

    pub fn date_of_epoch(&self, seconds: i64) -> Option<NaiveDate> {
        DateTime::<Utc>::from_timestamp(seconds, 0).map(|instant| self.date_of(&instant))
    }

    pub fn today(&self, now: DateTime<Utc>) -> DateKey {
        DateKey(self.date_of(&now))
    }
}

/// Anything the normalizer accepts.
#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Text(&'a str),
    EpochSeconds(i64),
    Date(NaiveDate),
    /// Wall-clock time already expressed in the local calendar.
    LocalDateTime(NaiveDateTime),
    Instant(DateTime<Utc>),
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(value: &'a str) -> Self {
        DateInput::Text(value)
    }
}

impl<'a> From<&'a String> for DateInput<'a> {
    fn from(value: &'a String) -> Self {
        DateInput::Text(value.as_str())
    }
}

impl From<NaiveDate> for DateInput<'_> {
    fn from(value: NaiveDate) -> Self {
        DateInput::Date(value)
    }
}

impl From<NaiveDateTime> for DateInput<'_> {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::LocalDateTime(value)
    }
}

impl From<DateTime<Utc>> for DateInput<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        DateInput::Instant(value)
    }
}

impl From<DateKey> for DateInput<'_> {
    fn from(value: DateKey) -> Self {
        DateInput::Date(value.date())
    }
}

/// Canonicalize a date-like value to a [`DateKey`] in `zone`.
///
/// Returns `None` for anything that does not describe a real calendar day; callers skip
/// such records instead of inventing a key.
pub fn normalize<'a>(input: impl Into<DateInput<'a>>, zone: &CalendarZone) -> Option<DateKey> {
    match input.into() {
        DateInput::Text(raw) => normalize_text(raw, zone),
        DateInput::EpochSeconds(seconds) => zone.date_of_epoch(seconds).map(DateKey),
        DateInput::Date(date) => Some(DateKey(date)),
        DateInput::LocalDateTime(value) => Some(DateKey(value.date())),
        DateInput::Instant(instant) => Some(DateKey(zone.date_of(&instant))),
    }
}

fn normalize_text(raw: &str, zone: &CalendarZone) -> Option<DateKey> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if DATE_KEY_PATTERN.is_match(value) {
        return DateKey::parse(value);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(DateKey(zone.date_of(&instant)));
    }

    if let Ok(instant) = DateTime::parse_from_rfc2822(value) {
        return Some(DateKey(zone.date_of(&instant)));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(DateKey(naive.date()));
        }
    }

    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(DateKey)
}

/// First day of the month eleven months before `today`: the start of a 12-month heatmap.
pub fn window_start(today: DateKey) -> DateKey {
    let date = today.date();
    let months_back = 11;
    let total = date.year() * 12 + date.month0() as i32 - months_back;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .map(DateKey)
        .unwrap_or(today)
}

/// Every day from `start` through `end`, inclusive.
pub fn date_range(start: DateKey, end: DateKey) -> Vec<DateKey> {
    let span = end.days_since(&start);
    if span < 0 {
        return Vec::new();
    }
    (0..=span)
        .filter_map(|offset| start.date().checked_add_signed(Duration::days(offset)))
        .map(DateKey)
        .collect()
}
