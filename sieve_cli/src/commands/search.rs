use crate::cli::{Cli, OutputFormat};
use crate::commands::{renderer, spinner, Result};
use crate::output::{format_output, OutputData};
use sieve_core::{SieveConfig, WebSearchEngine, WebSearchService};

/// Run `sieve search`. An explicit `--engine` beats config and environment.
pub async fn run(
    cli: &Cli,
    config: &SieveConfig,
    query: &str,
    engine: Option<WebSearchEngine>,
) -> Result<()> {
    let engine = engine.unwrap_or(config.engine);
    let service = WebSearchService::new(engine, renderer(config)?, config.timeout());

    let progress = spinner(
        format!("Searching {} for '{}'...", engine, query),
        cli.output == OutputFormat::Pretty,
    );
    let result = service.search(query).await;
    progress.finish_and_clear();

    let output = OutputData::SearchResults {
        engine: engine.to_string(),
        query: query.to_string(),
        results: result?,
    };
    format_output(&output, &cli.output)
}
