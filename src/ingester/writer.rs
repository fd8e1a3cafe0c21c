//! Artifact writes for one ingestion run

use super::merge::MergedTable;
use super::source::Dataset;
use crate::artifact::ArtifactKey;
use crate::clock::RunTimestamp;
use crate::Result;

use object_store::{ObjectStore, PutPayload};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Writes raw and merged artifacts. One `put` per artifact; a failed put is
/// returned as-is and nothing already written is removed.
#[derive(Clone)]
pub struct ArtifactWriter {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactWriter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    async fn put(&self, key: ArtifactKey, bytes: Vec<u8>) -> Result<ArtifactKey> {
        let size = bytes.len();
        self.store
            .put(&key.to_path(), PutPayload::from(bytes))
            .await?;
        info!(key = %key, bytes = size, "Artifact written");
        Ok(key)
    }

    /// Store an upstream document verbatim under `raw/{year}/`.
    pub async fn write_raw(
        &self,
        dataset: Dataset,
        year: i32,
        timestamp: RunTimestamp,
        document: &Value,
    ) -> Result<ArtifactKey> {
        let key = ArtifactKey::raw(dataset.basename(), year, timestamp);
        self.put(key, serde_json::to_vec(document)?).await
    }

    /// Store the merged table as a columnar artifact under `cleansed/{year}/`.
    pub async fn write_table(
        &self,
        year: i32,
        timestamp: RunTimestamp,
        table: &MergedTable,
    ) -> Result<ArtifactKey> {
        let key = ArtifactKey::cleansed_poll(year, timestamp);
        self.put(key, table.to_artifact().to_bytes()?).await
    }
}
