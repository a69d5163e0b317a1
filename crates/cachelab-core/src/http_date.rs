//! HTTP-date timestamps.
//!
//! Validators carried in `Last-Modified` and `If-Modified-Since` use the
//! IMF-fixdate format (`Sun, 06 Nov 1994 08:49:37 GMT`), which has one second
//! of resolution. [`HttpDate`] stores UTC at that resolution so comparisons
//! agree with what went over the wire.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Preferred HTTP-date format.
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 format, still accepted on input.
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// Obsolete ANSI C `asctime()` format, still accepted on input.
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// A UTC timestamp with whole-second precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpDate(DateTime<Utc>);

impl HttpDate {
    /// Creates an `HttpDate`, dropping sub-second precision.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::from_unix_secs(dt.timestamp()).unwrap_or(Self(dt))
    }

    /// Creates an `HttpDate` from seconds since the Unix epoch.
    #[must_use]
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self)
    }

    /// Returns seconds since the Unix epoch.
    #[must_use]
    pub fn unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns the underlying `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Truncates down to a multiple of `granularity` since the epoch.
    ///
    /// A granularity under one second leaves the date unchanged.
    #[must_use]
    pub fn truncate(&self, granularity: Duration) -> Self {
        let step = i64::try_from(granularity.as_secs()).unwrap_or(i64::MAX);
        if step <= 1 {
            return *self;
        }
        let secs = self.unix_secs();
        Self::from_unix_secs(secs - secs.rem_euclid(step)).unwrap_or(*self)
    }

    /// Parses any of the three HTTP-date formats.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedValidator`] if the value matches none of them.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        [IMF_FIXDATE, RFC_850, ASCTIME]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| Error::malformed_validator("http-date", value))
    }

    /// Formats the date as IMF-fixdate.
    #[must_use]
    pub fn to_http_string(&self) -> String {
        self.0.format(IMF_FIXDATE).to_string()
    }
}

impl From<DateTime<Utc>> for HttpDate {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl fmt::Debug for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HttpDate({})", self.to_http_string())
    }
}

impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_http_string())
    }
}

impl Serialize for HttpDate {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_http_string())
    }
}

impl<'de> Deserialize<'de> for HttpDate {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HttpDate::parse(&s).map_err(serde::de::Error::custom)
    }
}
