// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use haven_client::ClientConfig;
use haven_core::{Error, Result};

use crate::cli::ConfigCommand;

/// Execute a config subcommand.
pub fn run(cmd: ConfigCommand, path: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let config = super::load_config(path)?;
            print!("{}", render(&config)?);
            Ok(())
        }
        ConfigCommand::Init { base_url, force } => {
            let target = target_path(path)?;
            init(&target, base_url, force)?;
            println!("Wrote config to {}", target.display());
            Ok(())
        }
    }
}

fn target_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => ClientConfig::default_path().ok_or_else(|| {
            Error::Config("no config directory on this platform\n  hint: pass --config <path>".to_string())
        }),
    }
}

pub(crate) fn render(config: &ClientConfig) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
}

/// Writes a default config to `path`, refusing to overwrite unless `force`.
pub(crate) fn init(path: &Path, base_url: Option<String>, force: bool) -> Result<ClientConfig> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {}\n  hint: use --force to overwrite",
            path.display()
        )));
    }

    let config = match base_url {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::default(),
    };
    config.validate()?;
    config.save(path)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
