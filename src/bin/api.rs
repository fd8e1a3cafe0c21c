//! Poll Position API Binary
//!
//! Stateless read API serving the newest merged poll artifacts.

use poll_position::api::{build_http_router, ApiConfig, ApiState};
use poll_position::config::ComponentFactory;
use poll_position::telemetry::Telemetry;
use poll_position::{Error, StorageConfig};

use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// Poll Position read API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP API port
    #[arg(long, env = "PORT", default_value = "8080")]
    http_port: u16,

    /// UI origin allowed by CORS
    #[arg(long, env = "UI_URL", default_value = "http://localhost:3000")]
    ui_url: String,

    /// Answer error payloads with 404/503/500 instead of 200
    #[arg(long, env = "API_STRICT_STATUS", default_value = "false")]
    strict_status: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _telemetry = Telemetry::init_for_component("poll-position-api", &args.log_level)?;

    info!("Starting Poll Position API");

    let config = ApiConfig {
        http_port: args.http_port,
        ui_url: args.ui_url.clone(),
        strict_status_codes: args.strict_status,
    };

    // Unconfigured storage still serves /health; data routes report the error
    let storage_config = StorageConfig::from_env()?;
    let object_store = ComponentFactory::create_object_store(&storage_config)?;
    if object_store.is_none() {
        warn!("Serving without object storage; data endpoints will return errors");
    }

    let router = build_http_router(ApiState::new(object_store, &config), &config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        http_port = config.http_port,
        ui_url = %config.ui_url,
        strict_status = config.strict_status_codes,
        "API ready"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("HTTP server error: {e}")))?;

    info!("API shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
