// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod invalidate;
pub mod queue;
pub mod request;
pub mod rules;

use std::path::Path;
use tokio::runtime::Runtime;

use haven_client::ClientConfig;
use haven_core::Result;

/// Loads the config from `path`, or the default location if it exists.
///
/// Falls back to built-in defaults when no path is given and no default file exists.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    if let Some(path) = path {
        return ClientConfig::load(path);
    }
    match ClientConfig::default_path() {
        Some(path) if path.exists() => ClientConfig::load(&path),
        _ => Ok(ClientConfig::default()),
    }
}

/// Runtime for commands that talk to the backend.
pub fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
