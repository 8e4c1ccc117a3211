//! Date arithmetic shared by the eligibility, scheduling, and agenda modules.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::Deserialize;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Source of "now" for every rule that compares against today.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Office-local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a single instant, used by demos and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self(date.and_time(time))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday to Friday days between `start` and `end`, both endpoints included.
pub fn working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| is_weekday(*day))
        .count() as u32
}

/// Completed years at `on`; the year only counts once the birthday has been reached.
pub fn age_in_years(birthdate: NaiveDate, on: NaiveDate) -> i32 {
    let mut years = on.year() - birthdate.year();
    if (on.month(), on.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    years
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Strict 24-hour `HH:MM`; `8:00` and `24:00` are rejected.
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    let bytes = raw.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    if !bytes
        .iter()
        .enumerate()
        .all(|(idx, b)| idx == 2 || b.is_ascii_digit())
    {
        return None;
    }
    NaiveTime::parse_from_str(raw, TIME_FORMAT).ok()
}

pub fn format_clock_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Absolute distance between two times of day in whole minutes.
pub fn minutes_apart(a: NaiveTime, b: NaiveTime) -> i64 {
    (a - b).num_minutes().abs()
}

pub fn is_wednesday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Wed
}

/// First and last day of a calendar month, or `None` for an impossible month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("failed to parse '{raw}' as YYYY-MM-DD"))
    })
}

pub(crate) mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_clock_time(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock_time(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("failed to parse '{raw}' as HH:MM"))
        })
    }
}

pub(crate) mod optional_clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => super::parse_clock_time(&raw).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("failed to parse '{raw}' as HH:MM"))
            }),
        }
    }
}
