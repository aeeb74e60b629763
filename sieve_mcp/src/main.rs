use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use sieve_core::{
    mcp_server::{JsonRpcHandler, McpServer},
    transport::StdioTransport,
    HttpRenderer, PageRenderer, SieveConfig, WebSearchEngine,
};

/// Serve web search and page reading as MCP tools over stdio
#[derive(Parser)]
#[command(name = "sieve_mcp", version)]
struct Args {
    /// Default search engine (google, baidu, bing, duckduckgo); tools may override it per call
    #[arg(long, value_parser = parse_engine)]
    engine: Option<WebSearchEngine>,

    /// Configuration file (defaults to <config dir>/sieve/config.toml)
    #[arg(long, env = "SIEVE_CONFIG")]
    config: Option<PathBuf>,
}

fn parse_engine(raw: &str) -> Result<WebSearchEngine, String> {
    raw.parse().map_err(|e: sieve_core::SieveError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Sieve MCP Server");

    let mut config = SieveConfig::load(args.config.as_deref())?;
    if let Some(engine) = args.engine {
        config.engine = engine;
    }

    let renderer: Arc<dyn PageRenderer> = Arc::new(HttpRenderer::new(&config)?);
    let server = McpServer::new(config, renderer)?;
    let handler = JsonRpcHandler::new(server);
    let transport = StdioTransport::new(handler);

    info!("MCP Server ready, listening on stdio");

    tokio::select! {
        result = transport.run() => {
            if let Err(e) = result {
                error!("Transport error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    Ok(())
}
