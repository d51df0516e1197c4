use anyhow::Result;
use clap::{Parser, Subcommand};
use galley_execution::{LogFormat, init_tracing};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "galley")]
#[command(about = "Galley - room-service order intake from guest conversations", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the intake engine from the terminal, as a guest or as staff
    Chat {
        /// Catalog file with [[item]] and [[room]] tables
        #[arg(long)]
        catalog: PathBuf,
        /// Config file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Treat input as voice transcripts
        #[arg(long)]
        voice: bool,
        /// Session key / sender (phone number or call id)
        #[arg(long, default_value = "terminal")]
        from: String,
    },
    /// Print the order lines extracted from one utterance as JSON
    Extract {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        voice: bool,
        text: String,
    },
    /// List the available menu items
    Menu {
        #[arg(long)]
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Human
    };
    init_tracing(format)?;

    match cli.command {
        Commands::Chat {
            catalog,
            config,
            voice,
            from,
        } => commands::chat::run(&catalog, config.as_deref(), voice, &from).await?,
        Commands::Extract {
            catalog,
            config,
            voice,
            text,
        } => commands::extract::run(&catalog, config.as_deref(), voice, &text).await?,
        Commands::Menu { catalog } => commands::menu::run(&catalog).await?,
    }

    Ok(())
}
