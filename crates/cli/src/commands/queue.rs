// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use haven_client::{ClientConfig, QueueJournal, ResilientClient};
use haven_core::{Error, Operation, Result};

use crate::cli::{OutputFormat, QueueCommand};

/// Execute a queue subcommand.
pub fn run(cmd: QueueCommand, mut config: ClientConfig) -> Result<()> {
    match cmd {
        QueueCommand::Show { output } => {
            let journal = open_journal(&config)?;
            println!("{}", render(&journal.read_all()?, output)?);
            Ok(())
        }
        QueueCommand::Drain => {
            open_journal(&config)?;
            config.start_online = true;
            let client = ResilientClient::new(config)?;

            let (replayed, remaining) = super::runtime()?.block_on(async {
                let replayed = client.drain().await;
                (replayed, client.pending_writes().await)
            });

            println!("Replayed {} queued write(s)", replayed);
            if remaining > 0 {
                println!("{} write(s) still queued", remaining);
            }
            Ok(())
        }
    }
}

fn open_journal(config: &ClientConfig) -> Result<QueueJournal> {
    let path = config.queue_journal.as_deref().ok_or_else(|| {
        Error::Config("no queue_journal configured\n  hint: set queue_journal in the config file".to_string())
    })?;
    QueueJournal::open(path)
}

pub(crate) fn render(operations: &[Operation], output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Text => {
            if operations.is_empty() {
                return Ok("No queued writes.".to_string());
            }
            Ok(operations
                .iter()
                .enumerate()
                .map(|(i, op)| match op.idempotency_key() {
                    Some(key) => format!("{}. {} (key {})", i + 1, op, key),
                    None => format!("{}. {}", i + 1, op),
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(operations)?),
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
