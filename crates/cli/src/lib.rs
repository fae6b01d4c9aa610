// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! havenctl - operator tool for the haven data-access layer.
//!
//! Wraps [`haven_client::ResilientClient`] and the invalidation graph from
//! [`haven_core`] behind a small command set:
//!
//! - `rules` / `invalidate` inspect the invalidation graph
//! - `request` runs one operation through the full resilient pipeline
//! - `config` shows or writes the client configuration
//! - `queue` inspects or replays the persisted offline queue

mod cli;
mod commands;

pub use cli::{Cli, Command, ConfigCommand, OutputFormat, QueueCommand, RequestArgs};
pub use haven_core::{Error, Result};

/// Executes a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Rules { output } => commands::rules::run(output),
        Command::Invalidate { entity, id, output } => {
            commands::invalidate::run(&entity, id.as_deref(), output)
        }
        Command::Request(args) => {
            let config = commands::load_config(config_path)?;
            commands::request::run(config, &args)
        }
        Command::Config(cmd) => commands::config::run(cmd, config_path),
        Command::Queue(cmd) => {
            let config = commands::load_config(config_path)?;
            commands::queue::run(cmd, config)
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
