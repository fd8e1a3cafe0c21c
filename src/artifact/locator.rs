//! Artifact discovery over an object store
//!
//! "Latest" always means the greatest store-reported `last_modified`. The
//! timestamp embedded in the key is written by the ingesting process and can
//! collide or drift, so it never decides freshness.

use super::{
    parse_season_segment, ARTIFACT_SUFFIX, CLEANSED_PREFIX, POLL_BASENAME, RAW_PREFIX,
};
use crate::Result;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tracing::debug;

/// Listing metadata for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactInfo {
    pub key: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

fn serialize_rfc3339<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339())
}

impl From<&ObjectMeta> for ArtifactInfo {
    fn from(meta: &ObjectMeta) -> Self {
        Self {
            key: meta.location.to_string(),
            last_modified: meta.last_modified,
            size: meta.size as u64,
        }
    }
}

/// Pick the most recently modified artifact. Identical modification times
/// fall back to the greater key so the choice is stable.
pub fn select_latest<I>(candidates: I) -> Option<ArtifactInfo>
where
    I: IntoIterator<Item = ArtifactInfo>,
{
    candidates
        .into_iter()
        .max_by(|a, b| a.last_modified.cmp(&b.last_modified).then_with(|| a.key.cmp(&b.key)))
}

/// Finds artifacts of one basename under one prefix, partitioned by season.
#[derive(Clone)]
pub struct ArtifactLocator {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    basename: String,
}

impl ArtifactLocator {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>, basename: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            basename: basename.into(),
        }
    }

    /// Merged poll artifacts served by the read API.
    pub fn cleansed_polls(store: Arc<dyn ObjectStore>) -> Self {
        Self::new(store, CLEANSED_PREFIX, POLL_BASENAME)
    }

    /// Raw upstream payloads of one dataset.
    pub fn raw(store: Arc<dyn ObjectStore>, basename: &str) -> Self {
        Self::new(store, RAW_PREFIX, basename)
    }

    fn matches(&self, key: &str) -> bool {
        let file_name = key.rsplit('/').next().unwrap_or(key);
        file_name.contains(&format!("{}_", self.basename)) && key.ends_with(ARTIFACT_SUFFIX)
    }

    fn listing_prefix(&self, season: Option<i32>) -> Path {
        match season {
            Some(season) => Path::from(format!("{}/{}", self.prefix, season)),
            None => Path::from(self.prefix.as_str()),
        }
    }

    /// All matching artifacts of one season, or of every season when `None`.
    pub async fn list(&self, season: Option<i32>) -> Result<Vec<ArtifactInfo>> {
        let prefix = self.listing_prefix(season);
        let objects: Vec<ObjectMeta> = self.store.list(Some(&prefix)).try_collect().await?;

        let artifacts: Vec<ArtifactInfo> = objects
            .iter()
            .map(ArtifactInfo::from)
            .filter(|info| self.matches(&info.key))
            .collect();

        debug!(
            prefix = %prefix,
            listed = objects.len(),
            matched = artifacts.len(),
            "Listed artifacts"
        );
        Ok(artifacts)
    }

    /// Most recently modified artifact. `Ok(None)` means nothing has been
    /// written yet, which is an expected state rather than a failure.
    pub async fn latest(&self, season: Option<i32>) -> Result<Option<ArtifactInfo>> {
        Ok(select_latest(self.list(season).await?))
    }

    /// Metadata for every artifact of a season, newest first.
    pub async fn list_season(&self, season: i32) -> Result<Vec<ArtifactInfo>> {
        let mut artifacts = self.list(Some(season)).await?;
        artifacts.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| b.key.cmp(&a.key))
        });
        Ok(artifacts)
    }

    /// Seasons with a partition under the prefix, newest first. Partition
    /// names that are not purely numeric are skipped.
    pub async fn seasons(&self) -> Result<Vec<i32>> {
        let prefix = Path::from(self.prefix.as_str());
        let listing = self.store.list_with_delimiter(Some(&prefix)).await?;

        let mut seasons: Vec<i32> = listing
            .common_prefixes
            .iter()
            .filter_map(|partition| partition.filename())
            .filter_map(parse_season_segment)
            .collect();
        seasons.sort_unstable_by(|a, b| b.cmp(a));
        seasons.dedup();
        Ok(seasons)
    }

    /// Read an artifact's bytes.
    pub async fn fetch(&self, artifact: &ArtifactInfo) -> Result<Vec<u8>> {
        let result = self.store.get(&Path::from(artifact.key.as_str())).await?;
        Ok(result.bytes().await?.to_vec())
    }
}
