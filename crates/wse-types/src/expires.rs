//! # Lease Expressions
//!
//! `Expires` values travel either as an `xs:duration` literal (`PT10M`,
//! `P1DT2H`, `-PT5S`) or as an absolute RFC 3339 timestamp. Calendar units
//! (years, months) have no fixed length and are rejected.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Errors from parsing a lease expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpiresParseError {
    #[error("empty lease expression")]
    Empty,

    #[error("malformed lease expression: {0}")]
    Malformed(String),

    #[error("calendar units are not allowed in lease expression: {0}")]
    CalendarUnits(String),

    #[error("lease expression out of range: {0}")]
    OutOfRange(String),
}

/// A requested or granted lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expires {
    /// Relative lease length; may be zero or negative when requested by a peer.
    Duration(chrono::Duration),
    /// Absolute deadline.
    DateTime(DateTime<Utc>),
}

impl Expires {
    /// Relative lease of `secs` seconds.
    #[must_use]
    pub fn seconds(secs: i64) -> Self {
        Self::Duration(chrono::Duration::seconds(secs))
    }

    /// Lease length measured from `now`.
    #[must_use]
    pub fn relative_to(&self, now: DateTime<Utc>) -> chrono::Duration {
        match self {
            Self::Duration(d) => *d,
            Self::DateTime(at) => *at - now,
        }
    }
}

impl fmt::Display for Expires {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration(d) => f.write_str(&format_duration(*d)),
            Self::DateTime(at) => f.write_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl FromStr for Expires {
    type Err = ExpiresParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ExpiresParseError::Empty);
        }
        if s.starts_with('P') || s.starts_with("-P") {
            return parse_duration(s).map(Self::Duration);
        }
        DateTime::parse_from_rfc3339(s)
            .map(|at| Self::DateTime(at.with_timezone(&Utc)))
            .map_err(|e| ExpiresParseError::Malformed(format!("{s}: {e}")))
    }
}

impl Serialize for Expires {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Expires {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse an `xs:duration` literal restricted to day/time units.
pub fn parse_duration(literal: &str) -> Result<chrono::Duration, ExpiresParseError> {
    let malformed = || ExpiresParseError::Malformed(literal.to_string());

    let (negative, rest) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };
    let rest = rest.strip_prefix('P').ok_or_else(malformed)?;
    if rest.is_empty() {
        return Err(malformed());
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((_, "")) => return Err(malformed()),
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut total: i64 = 0;
    for (designator, value) in components(date_part, &['Y', 'M', 'D'], literal)? {
        match designator {
            'Y' | 'M' => return Err(ExpiresParseError::CalendarUnits(literal.to_string())),
            _ => total = accumulate(total, whole(value, literal)?, MS_PER_DAY, literal)?,
        }
    }
    if let Some(time) = time_part {
        for (designator, value) in components(time, &['H', 'M', 'S'], literal)? {
            total = match designator {
                'H' => accumulate(total, whole(value, literal)?, MS_PER_HOUR, literal)?,
                'M' => accumulate(total, whole(value, literal)?, MS_PER_MINUTE, literal)?,
                _ => total
                    .checked_add(seconds_ms(value, literal)?)
                    .ok_or_else(|| ExpiresParseError::OutOfRange(literal.to_string()))?,
            };
        }
    }

    let total = if negative { -total } else { total };
    Ok(chrono::Duration::milliseconds(total))
}

/// Render a duration as an `xs:duration` literal with millisecond precision.
#[must_use]
pub fn format_duration(duration: chrono::Duration) -> String {
    let total = duration.num_milliseconds();
    let mut ms = total.unsigned_abs();
    let mut out = String::new();
    if total < 0 {
        out.push('-');
    }
    out.push('P');

    let days = ms / MS_PER_DAY as u64;
    ms %= MS_PER_DAY as u64;
    let hours = ms / MS_PER_HOUR as u64;
    ms %= MS_PER_HOUR as u64;
    let minutes = ms / MS_PER_MINUTE as u64;
    ms %= MS_PER_MINUTE as u64;
    let seconds = ms / MS_PER_SECOND as u64;
    let millis = ms % MS_PER_SECOND as u64;

    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || millis > 0 || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if millis > 0 {
            out.push_str(&format!("{seconds}.{millis:03}S"));
        } else if seconds > 0 || (hours == 0 && minutes == 0) {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}

/// Split `part` into `(designator, number)` pairs, designators in `order`.
fn components<'a>(
    part: &'a str,
    order: &[char],
    literal: &str,
) -> Result<Vec<(char, &'a str)>, ExpiresParseError> {
    let malformed = || ExpiresParseError::Malformed(literal.to_string());
    let mut out = Vec::new();
    let mut start = 0;
    let mut next = 0;

    for (i, c) in part.char_indices() {
        if c.is_ascii_digit() || c == '.' {
            continue;
        }
        let offset = order[next..]
            .iter()
            .position(|d| *d == c)
            .ok_or_else(malformed)?;
        let number = &part[start..i];
        if number.is_empty() || (number.contains('.') && c != 'S') {
            return Err(malformed());
        }
        out.push((c, number));
        next += offset + 1;
        start = i + c.len_utf8();
    }
    if start != part.len() {
        return Err(malformed());
    }
    Ok(out)
}

fn whole(value: &str, literal: &str) -> Result<i64, ExpiresParseError> {
    value
        .parse::<i64>()
        .map_err(|_| ExpiresParseError::OutOfRange(literal.to_string()))
}

fn accumulate(total: i64, value: i64, unit: i64, literal: &str) -> Result<i64, ExpiresParseError> {
    value
        .checked_mul(unit)
        .and_then(|ms| total.checked_add(ms))
        .ok_or_else(|| ExpiresParseError::OutOfRange(literal.to_string()))
}

fn seconds_ms(value: &str, literal: &str) -> Result<i64, ExpiresParseError> {
    let (int, frac) = value.split_once('.').unwrap_or((value, ""));
    if int.is_empty() || frac.contains('.') {
        return Err(ExpiresParseError::Malformed(literal.to_string()));
    }
    let mut millis: i64 = 0;
    for (i, digit) in frac.chars().take(3).enumerate() {
        let d = i64::from(digit.to_digit(10).unwrap_or(0));
        millis += d * 10_i64.pow(2 - i as u32);
    }
    accumulate(millis, whole(int, literal)?, MS_PER_SECOND, literal)
}
