// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "havenctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator tool for the haven resilient data-access layer")]
#[command(
    long_about = "Operator tool for the haven resilient data-access layer.\n\n\
    Issue single operations through the retry, session-refresh and invalidation \
    pipeline, inspect the invalidation rules and manage client configuration."
)]
pub struct Cli {
    /// Path to the client config file (default: <config dir>/haven/client.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Log every attempt and invalidation (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the invalidation rule table
    Rules {
        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Print the cache keys a mutation of an entity marks stale
    #[command(after_help = "\
Examples:
  havenctl invalidate resident            Collection keys only
  havenctl invalidate incident --id i-42  Include the instance key")]
    Invalidate {
        /// Entity type (e.g. resident, support-plan)
        entity: String,

        /// Instance id of the mutated record
        #[arg(long)]
        id: Option<String>,

        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Run one operation through the resilient pipeline
    #[command(after_help = "\
Examples:
  havenctl request GET /residents
  havenctl request POST /incidents --body '{\"severity\":\"low\"}' --entity incident
  havenctl request PUT /rooms/r1 --body '{\"beds\":2}' --entity room --id r1 --retries 1")]
    Request(RequestArgs),

    /// Manage client configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Inspect or replay the persisted offline queue
    #[command(subcommand)]
    Queue(QueueCommand),
}

/// Arguments for `havenctl request`.
#[derive(clap::Args, Debug, Clone)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Target path relative to base_url, or an absolute URL
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Entity type the operation mutates; its dependents are marked stale on success
    #[arg(long)]
    pub entity: Option<String>,

    /// Instance id of the mutated entity
    #[arg(long, requires = "entity")]
    pub id: Option<String>,

    /// Bearer access token to send
    #[arg(long)]
    pub token: Option<String>,

    /// Per-attempt deadline in milliseconds
    #[arg(long, value_name = "ms", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Retries after the first attempt
    #[arg(long, conflicts_with = "no_retry")]
    pub retries: Option<u32>,

    /// Make a single attempt
    #[arg(long)]
    pub no_retry: bool,

    /// Output format
    #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Configuration management commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Write a default config file
    Init {
        /// Backend root URL to write
        #[arg(long, value_name = "url")]
        base_url: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Offline queue commands.
#[derive(Subcommand)]
pub enum QueueCommand {
    /// List writes waiting in the queue journal
    Show {
        /// Output format
        #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Replay journaled writes against the backend
    Drain,
}
