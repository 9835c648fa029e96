//! `wastewatch` - report illegal dumping and review reports on the ledger

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::WastewatchConfig;

#[derive(Debug, Parser)]
#[command(name = "wastewatch", version, about = "Evidence-gated illegal dumping reports")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "WASTEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload, verify and record a new report
    Submit(commands::SubmitArgs),
    /// Run image verification alone
    Verify {
        /// Hosted image URL
        url: String,
    },
    /// List all reports, most recent first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one report and where the map would center
    Show {
        /// Report id
        id: u64,
    },
    /// Mark a report as cleaned up
    Complete {
        /// Report id
        id: u64,
    },
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match WastewatchConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(bypass = config.workflow.bypass_verification, "configuration loaded");

    let result = match cli.command {
        Command::Submit(args) => commands::submit(&config, args).await,
        Command::Verify { url } => commands::verify(&config, &url).await,
        Command::List { json } => commands::list(&config, json).await,
        Command::Show { id } => commands::show(&config, id).await,
        Command::Complete { id } => commands::complete(&config, id).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
