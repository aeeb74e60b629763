use crate::cli::{Cli, OutputFormat};
use crate::commands::{renderer, spinner, Result};
use crate::output::{format_output, OutputData};
use sieve_core::{parse_target_url, ContentFormat, SieveConfig, WebLoader};
use std::time::Duration;
use tracing::debug;

/// Run `sieve read`. Every argument is validated before anything is fetched.
pub async fn run(
    cli: &Cli,
    config: &SieveConfig,
    inputs: &[String],
    timeout: Option<u64>,
    format: Option<ContentFormat>,
) -> Result<()> {
    let urls = inputs
        .iter()
        .map(|input| parse_target_url(input))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let timeout = timeout.map(Duration::from_secs).unwrap_or_else(|| config.timeout());
    let format = format.unwrap_or(config.content_format);
    let loader = WebLoader::from_config(renderer(config)?, config)?.with_format(format);

    let progress = spinner(
        format!("Reading {} page(s)...", urls.len()),
        cli.output == OutputFormat::Pretty,
    );
    let pages = loader.load(&urls, timeout).await;
    progress.finish_and_clear();
    let pages = pages?;

    debug!(requested = urls.len(), loaded = pages.len(), "read finished");
    format_output(
        &OutputData::Pages {
            requested: urls.len(),
            pages,
        },
        &cli.output,
    )
}
