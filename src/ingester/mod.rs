//! Ingestion pipeline for Poll Position
//!
//! One run:
//! - Fetches rankings and teams for a season year from the upstream API
//! - Stores both payloads verbatim under `raw/`
//! - Flattens every season on worker threads and left-joins teams on `school`
//! - Writes the merged table as a columnar artifact under `cleansed/`
//!
//! All artifacts of a run share one [`RunTimestamp`]. A failure at any step
//! aborts the run; rerunning only adds new artifacts.

mod flatten;
mod merge;
mod source;
mod writer;

pub use flatten::{flatten_all, flatten_season, flatten_value};
pub use merge::{merge, MergedRow, MergedTable, COLLISION_SUFFIX};
pub use source::{CfbApiClient, DataSource, Dataset, DEFAULT_API_BASE_URL};
pub use writer::ArtifactWriter;

use crate::artifact::{ArtifactInfo, ArtifactKey, ArtifactLocator};
use crate::clock::RunTimestamp;
use crate::schema::Team;
use crate::{Error, Result};

use object_store::ObjectStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Keys and counts produced by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub timestamp: RunTimestamp,
    /// Raw rankings artifact used as input
    pub rankings_key: String,
    /// Raw teams artifact used as input
    pub teams_key: String,
    /// Merged artifact written by the run
    pub poll_key: String,
    pub seasons: usize,
    pub rows: usize,
}

/// Batch ingestion over a data source and an object store.
pub struct Ingester {
    source: Arc<dyn DataSource>,
    store: Arc<dyn ObjectStore>,
    writer: ArtifactWriter,
}

impl Ingester {
    pub fn new(source: Arc<dyn DataSource>, store: Arc<dyn ObjectStore>) -> Self {
        let writer = ArtifactWriter::new(store.clone());
        Self {
            source,
            store,
            writer,
        }
    }

    /// Fetch, persist raw, merge, and persist the merged table for `year`.
    ///
    /// Both upstream fetches complete before anything is written, so an
    /// upstream failure leaves no artifacts behind.
    pub async fn run(&self, year: i32, timestamp: RunTimestamp) -> Result<IngestReport> {
        info!(year, timestamp = %timestamp, "Starting ingestion run");

        let (rankings, teams) = tokio::try_join!(
            self.source.fetch(Dataset::Rankings, year),
            self.source.fetch(Dataset::Teams, year),
        )?;

        let rankings_key = self
            .writer
            .write_raw(Dataset::Rankings, year, timestamp, &rankings)
            .await?;
        let teams_key = self
            .writer
            .write_raw(Dataset::Teams, year, timestamp, &teams)
            .await?;

        self.merge_and_write(year, timestamp, rankings, teams, rankings_key.to_key(), teams_key.to_key())
            .await
    }

    /// Rebuild the merged artifact for `year` from the newest raw artifacts
    /// already in the store, without contacting the upstream API.
    pub async fn remerge(&self, year: i32, timestamp: RunTimestamp) -> Result<IngestReport> {
        info!(year, timestamp = %timestamp, "Starting merge from stored raw artifacts");

        let (rankings_info, rankings) = self.load_latest_raw(Dataset::Rankings, year).await?;
        let (teams_info, teams) = self.load_latest_raw(Dataset::Teams, year).await?;

        self.merge_and_write(year, timestamp, rankings, teams, rankings_info.key, teams_info.key)
            .await
    }

    async fn load_latest_raw(&self, dataset: Dataset, year: i32) -> Result<(ArtifactInfo, Value)> {
        let locator = ArtifactLocator::raw(self.store.clone(), dataset.basename());
        let latest = locator.latest(Some(year)).await?.ok_or_else(|| {
            Error::NotFound(format!(
                "No raw {} artifact found for season {}",
                dataset.endpoint(),
                year
            ))
        })?;

        let source_run = ArtifactKey::parse(&latest.key).map(|key| key.timestamp.to_string());
        info!(
            key = %latest.key,
            source_run = %source_run.as_deref().unwrap_or("unknown"),
            "Using stored raw artifact"
        );

        let bytes = locator.fetch(&latest).await?;
        let document = serde_json::from_slice(&bytes)?;
        Ok((latest, document))
    }

    async fn merge_and_write(
        &self,
        year: i32,
        timestamp: RunTimestamp,
        rankings: Value,
        teams: Value,
        rankings_key: String,
        teams_key: String,
    ) -> Result<IngestReport> {
        let seasons = into_records(rankings, Dataset::Rankings)?;
        let season_count = seasons.len();
        let teams: Vec<Team> = into_records(teams, Dataset::Teams)?
            .into_iter()
            .map(Team::from_value)
            .collect();

        let rows = flatten_all(seasons).await?;
        let table = merge(rows, &teams);
        if table.is_empty() {
            warn!(year, seasons = season_count, "No ranking rows to merge; writing an empty artifact");
        }
        let poll_key = self.writer.write_table(year, timestamp, &table).await?;

        info!(
            year,
            seasons = season_count,
            teams = teams.len(),
            rows = table.len(),
            columns = table.columns().len(),
            poll_key = %poll_key,
            "Ingestion run complete"
        );

        Ok(IngestReport {
            timestamp,
            rankings_key,
            teams_key,
            poll_key: poll_key.to_key(),
            seasons: season_count,
            rows: table.len(),
        })
    }
}

/// Upstream documents are top-level lists of records.
fn into_records(document: Value, dataset: Dataset) -> Result<Vec<Value>> {
    match document {
        Value::Array(records) => Ok(records),
        other => Err(Error::Serialization(format!(
            "expected a JSON list of {} records, got {}",
            dataset.endpoint(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_records_requires_list() {
        assert_eq!(into_records(json!([1, 2]), Dataset::Teams).unwrap().len(), 2);
        let err = into_records(json!({"message": "rate limited"}), Dataset::Rankings).unwrap_err();
        assert!(err.to_string().contains("rankings"));
        assert!(err.to_string().contains("an object"));
    }
}
