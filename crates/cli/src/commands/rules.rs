// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use haven_core::{InvalidationGraph, Result};

use crate::cli::OutputFormat;

pub fn run(output: OutputFormat) -> Result<()> {
    println!("{}", render(&InvalidationGraph::standard(), output)?);
    Ok(())
}

/// Renders the rule table.
pub(crate) fn render(graph: &InvalidationGraph, output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Text => {
            let width = graph
                .rules()
                .iter()
                .map(|r| r.entity.as_str().len())
                .max()
                .unwrap_or(0);
            let lines: Vec<String> = graph
                .rules()
                .iter()
                .map(|rule| {
                    let mut line = format!(
                        "{:<width$}  {}",
                        rule.entity.as_str(),
                        rule.collections.join(", ")
                    );
                    if let Some(root) = &rule.instance_root {
                        line.push_str(&format!("  [{root}/<id>]"));
                    }
                    line
                })
                .collect();
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(graph.rules())?),
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
