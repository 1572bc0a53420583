//! `satori blob put|get`

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use satori_blob::BlobClient;
use satori_core::{config, BlobHash, TaskManager, TracingTaskManager};

use super::{home, token_override};

#[derive(Subcommand, Debug)]
pub enum BlobCommand {
    /// Upload a file and print its hash on stdout.
    Put(PutArgs),

    /// Download a blob by hash, to stdout unless --output is given.
    Get(GetArgs),
}

#[derive(Args, Debug)]
pub struct PutArgs {
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    pub hash: String,

    /// Write to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(command: BlobCommand) -> Result<()> {
    match command {
        BlobCommand::Put(args) => args.run(),
        BlobCommand::Get(args) => args.run(),
    }
}

fn client() -> Result<BlobClient> {
    let home = home()?;
    let config =
        config::load_at(&home).context("failed to load config; run `satori config init` first")?;
    let token = token_override()
        .or_else(|| config.token.clone())
        .unwrap_or_default();
    if token.is_empty() {
        tracing::warn!("no session token configured");
    }
    BlobClient::new(&config, &token).context("failed to set up blob client")
}

impl PutArgs {
    pub fn run(self) -> Result<()> {
        let client = client()?;
        let tasks = TracingTaskManager::new();
        let task = tasks.acquire();
        let hash = client
            .put_blob(&*task, &self.file)
            .with_context(|| format!("failed to upload '{}'", self.file.display()))?;
        println!("{hash}");
        Ok(())
    }
}

impl GetArgs {
    pub fn run(self) -> Result<()> {
        let client = client()?;
        let hash = BlobHash::from(self.hash);

        match self.output {
            Some(path) => {
                let tasks = TracingTaskManager::new();
                let task = tasks.acquire();
                let written = client
                    .get_blob(&*task, &hash, &path)
                    .with_context(|| format!("failed to download blob {hash}"))?;
                eprintln!(
                    "{} {written} bytes written to {}",
                    "✓".green(),
                    path.display()
                );
            }
            None => {
                let mut reader = client
                    .get_blob_stream(&hash)
                    .with_context(|| format!("failed to download blob {hash}"))?;
                let mut stdout = io::stdout().lock();
                io::copy(&mut reader, &mut stdout).context("failed to stream blob to stdout")?;
                stdout.flush().context("failed to flush stdout")?;
            }
        }
        Ok(())
    }
}
