//! Satori: test-data workbench command line.
//!
//! # Usage
//!
//! ```text
//! satori config show [--json]
//! satori config init --host <host> [--port <port>] [--no-ssl] [--token <token>] [--force]
//! satori blob put <file>
//! satori blob get <hash> [--output <file>]
//! ```
//!
//! `SATORI_TOKEN` overrides the token stored in `~/.satori/config.yaml`.
//! `RUST_LOG` controls diagnostics on stderr (default `warn`).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{blob::BlobCommand, config::ConfigCommand};

#[derive(Parser, Debug)]
#[command(
    name = "satori",
    version,
    about = "Manage Satori client settings and transfer test-data blobs",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show or write ~/.satori/config.yaml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Upload or download blobs.
    Blob {
        #[command(subcommand)]
        command: BlobCommand,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Config { command } => commands::config::run(command),
        Commands::Blob { command } => commands::blob::run(command),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
