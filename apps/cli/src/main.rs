//! dropcode command-line client.

mod config;
mod error;
mod receive;
mod send;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dropcode", version, about = "Share files with a 6-digit code")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload files and print the transfer code.
    Send {
        /// Files to share.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Fetch the files behind a transfer code.
    Receive {
        /// The 6-digit code from the sender.
        code: String,
        /// Directory the files are written to.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Send { files } => send::run(files).await,
        Command::Receive { code, out } => receive::run(&code, &out).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
