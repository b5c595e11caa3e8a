//! Analysis Services autostart service.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                    AUTOSTART                      │
//!                          │                                                   │
//!     Client Request       │  ┌─────────┐    ┌───────────┐    ┌────────────┐  │
//!     ─────────────────────┼─▶│  http   │───▶│  timeout  │───▶│orchestrator│  │
//!                          │  │ server  │    │   guard   │    │   (run)    │  │
//!                          │  └─────────┘    └───────────┘    └─────┬──────┘  │
//!                          │                                        │         │
//!                          │                   token ◀──────────────┤         │
//!                          │                   state / resume ◀─────┘         │──── Management API
//!                          │                                                   │
//!     Client Response      │  ┌──────────────────────┐                        │
//!     ◀────────────────────┼──│ responders (text/ODC) │◀── OrchestrationResult │
//!                          │  └──────────────────────┘                        │
//!                          │                                                   │
//!                          │  config · observability · resilience · lifecycle │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use autostart::config::{loader, AutostartConfig};
use autostart::http::{HttpServer, OdcTemplate};
use autostart::lifecycle::{self, signals, Shutdown};
use autostart::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "autostart")]
#[command(about = "Resumes a paused Analysis Services server on demand", long_about = None)]
struct Args {
    /// Path to the TOML config file (falls back to AUTOSTART_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match loader::resolve_path(args.config) {
        Some(path) => loader::load_config(&path)?,
        None => return Err("no config file given (use --config or AUTOSTART_CONFIG)".into()),
    };

    logging::init_logging(&config.observability);
    tracing::info!("autostart v{} starting", env!("CARGO_PKG_VERSION"));
    log_config(&config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let template = OdcTemplate::load(config.document.template_path.as_deref())?;
    let orchestrator = Arc::new(lifecycle::build_orchestrator(&config)?);

    let shutdown = Shutdown::new();
    let guard = lifecycle::build_guard(&config, shutdown.runs_token());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, orchestrator, guard, template);
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    signals::wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn log_config(config: &AutostartConfig) {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        server = %config.resource.server_name,
        resource_group = %config.resource.resource_group,
        deadline_secs = config.orchestration.deadline_secs,
        poll_base_ms = config.polling.base_delay_ms,
        poll_max_ms = config.polling.max_delay_ms,
        "Configuration loaded"
    );
}
