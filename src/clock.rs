//! Run-scoped timestamp used to correlate every artifact of one ingestion run
//!
//! A `RunTimestamp` is taken once when a run starts and handed to each writer
//! call of that run, so raw and cleansed outputs share one key suffix.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

/// strftime layout of the timestamp embedded in artifact keys.
/// Fixed width and zero padded, so keys of one prefix sort by time.
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";

/// A UTC instant truncated to whole seconds, rendered for artifact keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunTimestamp {
    at: DateTime<Utc>,
}

impl RunTimestamp {
    /// Capture the current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let whole_seconds = DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at);
        Self { at: whole_seconds }
    }

    /// Parse the key form (`2024-09-01T12-30-05Z`) back into a timestamp.
    pub fn parse(raw: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(raw, KEY_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| Self::from_datetime(naive.and_utc()))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.at
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.at.format(KEY_TIMESTAMP_FORMAT))
    }
}
