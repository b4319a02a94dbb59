use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

use tarmac::config::Config;
use tarmac::service::AirportServer;

/// Parameters for the airport server
pub struct ServeParams {
    pub config: Option<PathBuf>,
    pub bind: Option<SocketAddr>,
    pub enable_cors: Option<bool>,
    pub enable_logging: Option<bool>,
}

/// Load, validate and run the airport server until Ctrl+C
pub async fn serve(params: ServeParams) -> Result<()> {
    let ServeParams {
        config,
        bind,
        enable_cors,
        enable_logging,
    } = params;

    let mut config = match config {
        Some(path) => Config::from_file(&path)?,
        None => Config::from_env().context("Invalid TARMAC_* environment")?,
    };

    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }
    if let Some(enable_cors) = enable_cors {
        config.server.enable_cors = enable_cors;
    }
    if let Some(enable_logging) = enable_logging {
        config.server.enable_request_logging = enable_logging;
    }

    if let Err(e) = tarmac::metrics::init_metrics() {
        tracing::warn!("Metrics initialization failed: {}", e);
    }

    let server = AirportServer::from_config(&config).context("Failed to create airport server")?;

    println!("{}", server.info().display());
    println!();
    println!("API Endpoints:");
    println!("  GET  /api/health                 - Health check");
    println!("  GET  /metrics                    - Prometheus metrics endpoint");
    println!("  GET  /api/runways                - List runways");
    println!("  POST /api/runways                - Add a runway");
    println!("  GET  /api/runways/{{name}}         - Runway status");
    println!("  POST /api/runways/{{name}}/open    - Open a runway");
    println!("  POST /api/runways/{{name}}/close   - Close a runway");
    println!("  POST /api/flights                - Request a runway");
    println!("  GET  /api/flights/{{id}}/track     - Follow a flight (SSE)");
    println!("  POST /api/departures/issue       - Issue a departure");
    println!("  POST /api/departures/rearrange   - Rearrange queued flights");
    println!("  GET  /api/departures             - Query departures");
    println!();
    println!("Airport server listening on http://{}", config.server.bind_address);
    println!("Press Ctrl+C to stop.\n");

    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    println!("Airport server stopped.");
    Ok(())
}
