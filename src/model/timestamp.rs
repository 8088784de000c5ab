use chrono::{Duration, TimeZone as _, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

pub fn now() -> Timestamp {
    Utc::now().into()
}

/// A UTC instant that travels as an RFC 3339 string, which is how the backend
/// stores `timestamptz` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, new)]
pub struct Timestamp(chrono::DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp from seconds since the unix epoch.
    pub fn from_unix(seconds: i64) -> Option<Self> {
        Utc.timestamp_opt(seconds, 0).single().map(Self)
    }

    pub fn unix(self) -> i64 {
        self.0.timestamp()
    }
}

impl From<chrono::DateTime<Utc>> for Timestamp {
    fn from(value: chrono::DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.to_rfc3339().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        chrono::DateTime::parse_from_rfc3339(&s)
            .map(|dt| Self(dt.into()))
            .map_err(serde::de::Error::custom)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs)
    }
}
