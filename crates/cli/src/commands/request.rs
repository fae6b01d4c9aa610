// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use haven_client::{ClientConfig, ResilientClient, Session, StaleKeyLog};
use haven_core::{CacheKey, EntityType, Error, Method, Operation, Response, Result};

use crate::cli::{OutputFormat, RequestArgs};

pub fn run(mut config: ClientConfig, args: &RequestArgs) -> Result<()> {
    let operation = build_operation(args)?;

    // No platform connectivity signal here; assume the network is up
    config.start_online = true;

    let cache = Arc::new(StaleKeyLog::new());
    let mut builder = ResilientClient::http_builder(config).cache(cache.clone());
    if let Some(token) = &args.token {
        builder = builder.session(Session::new(token.as_str()));
    }
    let client = builder.build()?;

    let response = super::runtime()?.block_on(async {
        let replayed = client.drain().await;
        if replayed > 0 {
            info!("replayed {} journaled write(s) first", replayed);
        }
        client.execute(operation).await
    })?;

    println!("{}", render(&response, &cache.take(), args.output)?);
    Ok(())
}

/// Builds the operation described by the command line.
pub(crate) fn build_operation(args: &RequestArgs) -> Result<Operation> {
    let method: Method = args.method.parse()?;
    let mut operation = Operation::new(method, args.path.as_str());

    if let Some(body) = &args.body {
        let body: Value = serde_json::from_str(body)
            .map_err(|e| Error::InvalidInput(format!("invalid --body JSON: {}", e)))?;
        operation = operation.with_body(body);
    }
    if let Some(entity) = &args.entity {
        let entity: EntityType = entity.parse()?;
        operation = operation.invalidating(entity, args.id.as_deref());
    }
    if let Some(ms) = args.timeout_ms {
        operation = operation.with_timeout(Duration::from_millis(ms));
    }
    if let Some(retries) = args.retries {
        operation = operation.with_max_retries(retries);
    }
    if args.no_retry {
        operation = operation.without_retry();
    }
    Ok(operation)
}

/// Renders a response and the keys it marked stale.
pub(crate) fn render(response: &Response, stale: &[CacheKey], output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Text => {
            let mut out = match &response.body {
                Value::Null => format!("{} (no content)", response.status),
                Value::String(text) => text.clone(),
                body => serde_json::to_string_pretty(body)?,
            };
            if !stale.is_empty() {
                let keys: Vec<String> = stale.iter().map(ToString::to_string).collect();
                out.push_str(&format!("\nmarked stale: {}", keys.join(", ")));
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let keys: Vec<String> = stale.iter().map(ToString::to_string).collect();
            Ok(serde_json::to_string_pretty(&json!({
                "status": response.status,
                "attempts": response.attempts,
                "body": response.body,
                "stale": keys,
            }))?)
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
