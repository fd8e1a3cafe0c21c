//! Poll Position Ingest Binary
//!
//! One batch run: fetch rankings and teams for a season year, store the raw
//! payloads, and write the merged columnar artifact.

use poll_position::clock::RunTimestamp;
use poll_position::config::ComponentFactory;
use poll_position::ingester::{CfbApiClient, Ingester, DEFAULT_API_BASE_URL};
use poll_position::telemetry::Telemetry;
use poll_position::StorageConfig;

use clap::Parser;
use std::sync::Arc;
use tracing::info;

/// Poll Position ingestion run
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Season year to ingest
    #[arg(long, env = "SEASON_START_YEAR", default_value = "2024")]
    season_year: i32,

    /// Bearer token for the upstream API
    #[arg(long, env = "CFB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Upstream API base URL
    #[arg(long, env = "CFB_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Skip the upstream fetch and rebuild the merged artifact from the
    /// newest raw artifacts already in storage
    #[arg(long)]
    merge_only: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _telemetry = Telemetry::init_for_component("poll-position-ingest", &args.log_level)?;

    // Taken once; every artifact of this run carries it
    let timestamp = RunTimestamp::now();

    info!(
        season_year = args.season_year,
        merge_only = args.merge_only,
        timestamp = %timestamp,
        "Starting Poll Position ingest"
    );

    let storage_config = StorageConfig::from_env()?;
    let object_store = ComponentFactory::require_object_store(&storage_config)?;
    let source = Arc::new(CfbApiClient::new(&args.api_base_url, args.api_key.clone())?);
    let ingester = Ingester::new(source, object_store);

    let report = if args.merge_only {
        ingester.remerge(args.season_year, timestamp).await?
    } else {
        ingester.run(args.season_year, timestamp).await?
    };

    info!(
        poll_key = %report.poll_key,
        rankings_key = %report.rankings_key,
        teams_key = %report.teams_key,
        seasons = report.seasons,
        rows = report.rows,
        "Ingest finished"
    );

    Ok(())
}
