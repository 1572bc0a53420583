pub mod blob;
pub mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable that takes precedence over the configured token.
pub const TOKEN_ENV: &str = "SATORI_TOKEN";

pub fn home() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// Non-empty `SATORI_TOKEN`, if set.
pub fn token_override() -> Option<String> {
    std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty())
}
