//! Upstream ranking and team data source

use crate::artifact::{RANKINGS_BASENAME, TEAMS_BASENAME};
use crate::{Error, Result};

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Default base URL of the upstream API
pub const DEFAULT_API_BASE_URL: &str = "https://api.collegefootballdata.com";

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Upstream datasets fetched by an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Rankings,
    Teams,
}

impl Dataset {
    /// Endpoint path below the API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            Dataset::Rankings => "rankings",
            Dataset::Teams => "teams",
        }
    }

    /// Basename of the raw artifact holding this dataset
    pub fn basename(&self) -> &'static str {
        match self {
            Dataset::Rankings => RANKINGS_BASENAME,
            Dataset::Teams => TEAMS_BASENAME,
        }
    }
}

/// Source of raw upstream documents.
///
/// Implementations return the decoded JSON body untouched; shape checks
/// happen downstream.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, dataset: Dataset, year: i32) -> Result<Value>;
}

/// HTTP client for the CollegeFootballData API.
pub struct CfbApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CfbApiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    fn url(&self, dataset: Dataset) -> String {
        format!("{}/{}", self.base_url, dataset.endpoint())
    }
}

#[async_trait]
impl DataSource for CfbApiClient {
    async fn fetch(&self, dataset: Dataset, year: i32) -> Result<Value> {
        let url = self.url(dataset);
        debug!(url = %url, year, "Fetching upstream dataset");

        let mut request = self.client.get(&url).query(&[("year", year)]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(Error::Upstream {
                status: status.as_u16(),
                url,
                body,
            });
        }

        let document: Value = response.json().await?;
        info!(
            dataset = dataset.endpoint(),
            year,
            records = document.as_array().map(Vec::len).unwrap_or(0),
            "Fetched upstream dataset"
        );
        Ok(document)
    }
}
