// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;

use haven_core::{CacheKey, EntityType, InvalidationGraph, Result};

use crate::cli::OutputFormat;

pub fn run(entity: &str, id: Option<&str>, output: OutputFormat) -> Result<()> {
    let entity: EntityType = entity.parse()?;
    let keys = InvalidationGraph::standard().invalidate(entity, id);
    println!("{}", render_keys(&keys, output)?);
    Ok(())
}

/// Renders a key set, one key per line in text mode.
pub(crate) fn render_keys(keys: &BTreeSet<CacheKey>, output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Text => Ok(keys
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => {
            let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
            Ok(serde_json::to_string_pretty(&keys)?)
        }
    }
}

#[cfg(test)]
#[path = "invalidate_tests.rs"]
mod tests;
