pub mod read;
pub mod search;

use indicatif::{ProgressBar, ProgressStyle};
use sieve_core::{HttpRenderer, PageRenderer, SieveConfig};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Core(#[from] sieve_core::SieveError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// A stderr spinner, shown only for the pretty output format.
pub(crate) fn spinner(message: String, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Shared renderer for a command run.
pub(crate) fn renderer(config: &SieveConfig) -> Result<Arc<dyn PageRenderer>> {
    Ok(Arc::new(HttpRenderer::new(config)?))
}
