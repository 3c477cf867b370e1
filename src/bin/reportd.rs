//! meterview report server
//!
//! Serves rendered report results and the Prometheus datasource endpoints.

use meterview::api::{self, ApiState};
use meterview::config::{ComponentFactory, ServiceConfig};
use meterview::query::ReportService;
use meterview::telemetry::Telemetry;
use meterview::Error;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// meterview report server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP API port (overrides METERVIEW_HTTP_PORT)
    #[arg(long)]
    http_port: Option<u16>,

    /// Maximum request body size in bytes (overrides METERVIEW_MAX_BODY_BYTES)
    #[arg(long)]
    max_body_bytes: Option<usize>,

    /// Default tab padding for tabular output (overrides METERVIEW_TSV_PADDING)
    #[arg(long)]
    tsv_padding: Option<usize>,

    /// Fixture file used to seed the in-memory backends
    #[arg(long, env = "METERVIEW_FIXTURES")]
    fixtures: Option<PathBuf>,

    /// Disable permissive CORS headers
    #[arg(long)]
    disable_cors: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply(self, mut config: ServiceConfig) -> ServiceConfig {
        if let Some(port) = self.http_port {
            config.http_port = port;
        }
        if let Some(limit) = self.max_body_bytes {
            config.max_body_size = limit;
        }
        if let Some(padding) = self.tsv_padding {
            config.tsv_padding = padding;
        }
        if self.fixtures.is_some() {
            config.fixtures = self.fixtures;
        }
        if self.disable_cors {
            config.enable_cors = false;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _telemetry = Telemetry::init_for_component("meterview-reportd", &args.log_level)?;

    info!("Starting meterview report server");

    let config = args.apply(ServiceConfig::from_env()?);
    config.validate()?;
    let backends = ComponentFactory::create_backends(&config).await?;

    let reports = Arc::new(ReportService::new(backends.catalog, backends.results));
    let state = ApiState::new(reports, backends.metrics, config.api_config());
    let router = api::build_http_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        http_port = config.http_port,
        max_body_bytes = config.max_body_size,
        tsv_padding = config.tsv_padding,
        cors = config.enable_cors,
        "Report server ready"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("HTTP server error: {e}")))?;

    info!("Report server shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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
