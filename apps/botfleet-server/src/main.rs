mod config;
mod logging;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{AppConfig, CliOverrides};

/// Botfleet Server - multi-tenant bot platform API
#[derive(Parser)]
#[command(name = "botfleet-server")]
#[command(about = "Botfleet Server - multi-tenant bot platform API")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address override, e.g. 0.0.0.0:8087
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Database DSN override
    #[arg(long)]
    dsn: Option<String>,

    /// Print effective configuration (JSON, secrets masked) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Prepare the store and start the server
    Run,
    /// Converge the schema, backfill ownership and exit
    Migrate,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (BOTFLEET__*) -> 4) DATABASE_URL -> 5) CLI
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&CliOverrides {
        bind: cli.bind,
        dsn: cli.dsn.clone(),
        verbose: cli.verbose,
    });

    if cli.print_config {
        println!("{}", config.to_redacted_json()?);
        return Ok(());
    }

    logging::init_logging(&config.logging)?;

    let command = cli.command.unwrap_or(Commands::Run);
    config.validate(matches!(command, Commands::Run))?;
    let home_dir = config.resolve_home_dir()?;

    match command {
        Commands::Check => {
            println!("Configuration is valid");
            println!("{}", config.to_redacted_json()?);
            Ok(())
        }
        Commands::Migrate => {
            let db = server::connect(&config, &home_dir).await?;
            let summary = server::prepare(&db, &config).await?;
            println!("{summary}");
            db.close().await;
            Ok(())
        }
        Commands::Run => {
            tracing::info!("Botfleet Server starting");
            let db = server::connect(&config, &home_dir).await?;
            let summary = server::prepare(&db, &config).await?;
            tracing::info!("{summary}");

            let router = server::build_router(&db, &config)?;
            let result = server::serve(router, config.server.bind_addr).await;
            db.close().await;
            result
        }
    }
}
