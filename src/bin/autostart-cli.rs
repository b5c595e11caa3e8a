use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use autostart::config::loader;
use autostart::lifecycle;
use autostart::observability::logging;
use autostart::OrchestrationResult;

#[derive(Parser)]
#[command(name = "autostart-cli")]
#[command(about = "Operator CLI for the Analysis Services autostart service", long_about = None)]
struct Cli {
    /// Path to the TOML config file (falls back to AUTOSTART_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resume the server if needed and print its endpoint
    Wake,
    /// Print the server's current state and endpoint
    Status,
    /// Validate the config file and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let path = loader::resolve_path(cli.config)
        .ok_or("no config file given (use --config or AUTOSTART_CONFIG)")?;
    let config = loader::load_config(&path)?;

    match cli.command {
        Commands::CheckConfig => {
            println!("{}: ok", path.display());
            println!(
                "server {} in {}/{}",
                config.resource.server_name,
                config.resource.subscription_id,
                config.resource.resource_group
            );
        }
        Commands::Status => {
            logging::init_logging(&config.observability);
            let orchestrator = lifecycle::build_orchestrator(&config)?;
            let status = orchestrator.probe().await?;
            println!("state:    {}", status.state);
            println!(
                "endpoint: {}",
                status.endpoint.as_deref().unwrap_or("(not reported)")
            );
        }
        Commands::Wake => {
            logging::init_logging(&config.observability);
            let orchestrator = Arc::new(lifecycle::build_orchestrator(&config)?);
            let shutdown = CancellationToken::new();
            let guard = lifecycle::build_guard(&config, shutdown.clone());

            let result = tokio::select! {
                result = guard.run(orchestrator) => result,
                _ = tokio::signal::ctrl_c() => {
                    shutdown.cancel();
                    eprintln!("Interrupted");
                    std::process::exit(130);
                }
            };

            match result {
                OrchestrationResult::Ready { endpoint } => println!("{}", endpoint),
                other => {
                    eprintln!("Error: {}", other.label());
                    if let Err(e) = other.into_result() {
                        eprintln!("{}", e);
                    }
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
