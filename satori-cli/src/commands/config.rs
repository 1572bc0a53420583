//! `satori config show|init`

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;

use satori_core::config::{self, DEFAULT_BLOBS_PORT};
use satori_core::ClientConfig;

use super::{home, token_override, TOKEN_ENV};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the active configuration. The token itself is never printed.
    Show(ShowArgs),

    /// Write ~/.satori/config.yaml.
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Server host name, without scheme or port.
    #[arg(long)]
    pub host: String,

    /// Port of the blob endpoint.
    #[arg(long, default_value_t = DEFAULT_BLOBS_PORT)]
    pub port: u16,

    /// Talk plain HTTP instead of TLS.
    #[arg(long)]
    pub no_ssl: bool,

    /// Session token sent with every request.
    #[arg(long)]
    pub token: Option<String>,

    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show(args) => args.run(),
        ConfigCommand::Init(args) => args.run(),
    }
}

#[derive(Serialize)]
struct ConfigView {
    path: String,
    host: String,
    blobs_port: u16,
    use_ssl: bool,
    blob_url: String,
    token: &'static str,
}

impl ConfigView {
    fn new(path: String, config: &ClientConfig) -> Self {
        let token = if token_override().is_some() {
            "environment"
        } else if config.token.is_some() {
            "config file"
        } else {
            "not set"
        };
        Self {
            path,
            host: config.host.clone(),
            blobs_port: config.blobs_port,
            use_ssl: config.use_ssl,
            blob_url: config.blob_base_url(),
            token,
        }
    }
}

impl ShowArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let path = config::config_path_at(&home);
        let config = config::load_at(&home)
            .context("failed to load config; run `satori config init` first")?;
        let view = ConfigView::new(path.display().to_string(), &config);

        if self.json {
            let json = serde_json::to_string_pretty(&view).context("failed to encode config")?;
            println!("{json}");
            return Ok(());
        }

        println!("{}", view.path.bold());
        println!("  host:      {}", view.host);
        println!("  blob port: {}", view.blobs_port);
        println!("  tls:       {}", if view.use_ssl { "on" } else { "off" });
        println!("  blob url:  {}", view.blob_url);
        println!("  token:     {}", view.token);
        if view.token == "not set" {
            println!(
                "  {} pass --token to `satori config init` or set {TOKEN_ENV}",
                "hint:".yellow()
            );
        }
        Ok(())
    }
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let path = config::config_path_at(&home);
        if path.exists() && !self.force {
            bail!(
                "config already exists at {}; pass --force to overwrite",
                path.display()
            );
        }

        let config = ClientConfig {
            host: self.host,
            blobs_port: self.port,
            use_ssl: !self.no_ssl,
            token: self.token,
        };
        config::save_at(&home, &config)
            .with_context(|| format!("failed to write {}", path.display()))?;

        println!("{} Wrote {}", "✓".green(), path.display());
        println!("  blob url: {}", config.blob_base_url());
        Ok(())
    }
}
