//! Persisted artifacts: key layout, columnar encoding, and discovery
//!
//! Every artifact lives at `{prefix}/{season}/{basename}_{TIMESTAMP}.json`:
//!
//! - `raw/2024/rankings_2024-09-01T12-00-00Z.json` - upstream rankings, verbatim
//! - `raw/2024/teams_2024-09-01T12-00-00Z.json` - upstream teams, verbatim
//! - `cleansed/2024/poll_2024-09-01T12-00-00Z.json` - merged columnar table
//!
//! Artifacts are only ever added, never rewritten.

mod columnar;
mod locator;

pub use columnar::{decode_payload, reconstruct_rows, Column, ColumnarArtifact, Payload};
pub use locator::{ArtifactInfo, ArtifactLocator};

use crate::clock::RunTimestamp;
use object_store::path::Path;

/// Prefix of merged, columnar artifacts served by the read API
pub const CLEANSED_PREFIX: &str = "cleansed";
/// Prefix of verbatim upstream payloads
pub const RAW_PREFIX: &str = "raw";
/// Basename of merged poll artifacts
pub const POLL_BASENAME: &str = "poll";
/// Basename of raw rankings payloads
pub const RANKINGS_BASENAME: &str = "rankings";
/// Basename of raw teams payloads
pub const TEAMS_BASENAME: &str = "teams";
/// File suffix shared by all artifacts
pub const ARTIFACT_SUFFIX: &str = ".json";

/// Structured form of an artifact key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    pub prefix: String,
    pub season: i32,
    pub basename: String,
    pub timestamp: RunTimestamp,
}

impl ArtifactKey {
    pub fn new(
        prefix: impl Into<String>,
        season: i32,
        basename: impl Into<String>,
        timestamp: RunTimestamp,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            season,
            basename: basename.into(),
            timestamp,
        }
    }

    /// Merged poll artifact for a season.
    pub fn cleansed_poll(season: i32, timestamp: RunTimestamp) -> Self {
        Self::new(CLEANSED_PREFIX, season, POLL_BASENAME, timestamp)
    }

    /// Raw upstream payload for a season.
    pub fn raw(basename: &str, season: i32, timestamp: RunTimestamp) -> Self {
        Self::new(RAW_PREFIX, season, basename, timestamp)
    }

    /// Render as an object store key.
    pub fn to_key(&self) -> String {
        format!(
            "{}/{}/{}_{}{}",
            self.prefix, self.season, self.basename, self.timestamp, ARTIFACT_SUFFIX
        )
    }

    pub fn to_path(&self) -> Path {
        Path::from(self.to_key())
    }

    /// Parse a key written by [`ArtifactKey::to_key`]. Keys that do not follow
    /// the layout return `None`.
    pub fn parse(key: &str) -> Option<Self> {
        let mut segments = key.split('/');
        let prefix = segments.next()?;
        let season = parse_season_segment(segments.next()?)?;
        let file_name = segments.next()?;
        if segments.next().is_some() {
            return None;
        }

        let stem = file_name.strip_suffix(ARTIFACT_SUFFIX)?;
        let (basename, timestamp) = stem.rsplit_once('_')?;
        let timestamp = RunTimestamp::parse(timestamp)?;

        Some(Self::new(prefix, season, basename, timestamp))
    }
}

impl std::fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_key())
    }
}

/// Season partition segment: ASCII digits only, fitting an `i32`.
pub fn parse_season_segment(segment: &str) -> Option<i32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> RunTimestamp {
        RunTimestamp::parse(raw).unwrap()
    }

    #[test]
    fn test_cleansed_key_layout() {
        let key = ArtifactKey::cleansed_poll(2024, ts("2024-09-01T12-00-00Z"));
        assert_eq!(key.to_key(), "cleansed/2024/poll_2024-09-01T12-00-00Z.json");
    }

    #[test]
    fn test_raw_key_layout() {
        let key = ArtifactKey::raw(RANKINGS_BASENAME, 2023, ts("2023-11-30T01-02-03Z"));
        assert_eq!(key.to_string(), "raw/2023/rankings_2023-11-30T01-02-03Z.json");
    }

    #[test]
    fn test_parse_inverts_to_key() {
        let key = ArtifactKey::raw(TEAMS_BASENAME, 2022, ts("2022-08-15T23-59-59Z"));
        assert_eq!(ArtifactKey::parse(&key.to_key()), Some(key));
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert!(ArtifactKey::parse("cleansed/notyear/poll_2024-09-01T12-00-00Z.json").is_none());
        assert!(ArtifactKey::parse("cleansed/2024/poll.json").is_none());
        assert!(ArtifactKey::parse("cleansed/2024/poll_2024-09-01T12-00-00Z.csv").is_none());
        assert!(ArtifactKey::parse("cleansed/2024/extra/poll_2024-09-01T12-00-00Z.json").is_none());
    }

    #[test]
    fn test_season_segment_must_be_digits() {
        assert_eq!(parse_season_segment("2024"), Some(2024));
        assert_eq!(parse_season_segment("notyear"), None);
        assert_eq!(parse_season_segment("-2024"), None);
        assert_eq!(parse_season_segment("+2024"), None);
        assert_eq!(parse_season_segment(""), None);
        assert_eq!(parse_season_segment("99999999999"), None);
    }
}
