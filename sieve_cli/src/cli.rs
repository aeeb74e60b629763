use clap::{Parser, Subcommand, ValueEnum};
use sieve_core::{ContentFormat, SieveError, WebSearchEngine};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Sieve - search the web and read pages without the clutter")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  sieve search \"rust async runtime\"              Search with the default engine
  sieve search --engine duckduckgo \"tokio\"       Pick an engine for one search
  sieve read https://tokio.rs/                   Extract a page's main content
  sieve read URL1 URL2 --timeout 10              Read several pages, 10s budget

\x1b[1;36mConfiguration:\x1b[0m
  SEARCH_ENGINE                                  Default engine (google, baidu, bing, duckduckgo)
  SIEVE_TIMEOUT_SECS                             Default page budget in seconds
  ~/.config/sieve/config.toml                    Config file (see --config)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Configuration file (defaults to <config dir>/sieve/config.toml)
    #[arg(long, global = true, env = "SIEVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search a query on a web search engine
    ///
    /// Renders the engine's results page and lists title, URL and snippet for
    /// each result.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  sieve search \"rust programming\"
  sieve search --engine bing \"crates.io\" --output json")]
    Search {
        /// Query to search for
        query: String,

        /// Search engine to use (google, baidu, bing, duckduckgo); overrides SEARCH_ENGINE
        #[arg(short, long, value_parser = parse_engine)]
        engine: Option<WebSearchEngine>,
    },

    /// Read the main content of one or more web pages
    ///
    /// All URLs load concurrently under one time budget. Pages that finish in
    /// time are printed in the order they finished.
    #[command(alias = "scrap")]
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  sieve read https://www.rust-lang.org/
  sieve read https://a.example/ https://b.example/ --timeout 5 --format markdown")]
    Read {
        /// URLs to read
        #[arg(required = true)]
        urls: Vec<String>,

        /// Seconds to wait before returning whatever has loaded
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,

        /// Shape of the extracted content (html, markdown)
        #[arg(short, long, value_parser = parse_format)]
        format: Option<ContentFormat>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// Plain text output
    Text,
}

fn parse_engine(raw: &str) -> Result<WebSearchEngine, String> {
    raw.parse().map_err(|e: SieveError| e.to_string())
}

fn parse_format(raw: &str) -> Result<ContentFormat, String> {
    raw.parse().map_err(|e: SieveError| e.to_string())
}
