use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{BatchProgress, ConfigCommand, GenerateCommand, HookCommand, RemoveCommand};
use common::{init_structured_logging, LoggingConfig};
use docgen::DocService;
use domain::ConfigHandle;
use infrastructure::ConfigLoader;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "docforge")]
#[command(about = "Generate and maintain JavaDoc comments from templates or an AI model")]
#[command(version)]
struct Cli {
    /// Configuration file to use instead of the default search paths
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write JavaDoc comments for the given files or directories
    #[command(alias = "gen")]
    Generate(GenerateCommand),

    /// Strip JavaDoc comments from the given files or directories
    Remove(RemoveCommand),

    /// Handle a save or create event for a single file
    Hook(HookCommand),

    /// Inspect or create configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default().with_verbosity(cli.verbose);
    logging.json_output = cli.json_logs;
    if let Err(e) = init_structured_logging(logging) {
        eprintln!("Failed to initialise logging: {e}");
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let loader = ConfigLoader::new();

    if let Commands::Config(command) = &cli.command {
        command.execute(&loader, cli.config.as_deref()).await?;
        return Ok(true);
    }

    let config = match &cli.config {
        Some(path) => loader.load_from(path).await?,
        None => loader.load().await?,
    };
    let service = DocService::new(ConfigHandle::new(config));

    let success = match cli.command {
        Commands::Generate(command) => {
            let cancel = CancellationToken::new();
            spawn_ctrl_c(cancel.clone());
            let summary = command
                .execute(&service, BatchProgress::new(0), cancel)
                .await?;
            summary.print();
            summary.is_success()
        }
        Commands::Remove(command) => {
            let summary = command.execute(&service, BatchProgress::new(0)).await?;
            summary.print();
            summary.is_success()
        }
        Commands::Hook(command) => command.execute(&service).await?,
        Commands::Config(_) => true,
    };

    service.shutdown();
    Ok(success)
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, finishing the current element");
                cancel.cancel();
            }
            Err(e) => info!("Could not listen for Ctrl-C: {}", e),
        }
    });
}
