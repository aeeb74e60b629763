//! Web search through a rendered results page.
//!
//! [`HeadlessSearchService`] renders an engine's results page with a
//! [`PageRenderer`], sanitizes it and reads result entries off it.
//! [`WebSearchService`] is the entry point callers hold; it delegates to any
//! [`SearchService`], which keeps the backend swappable.

mod engine;

pub use engine::WebSearchEngine;

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::SieveError;
use crate::render::PageRenderer;
use crate::sanitize::sanitize;
use crate::types::SearchResult;
use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

#[async_trait]
pub trait SearchService: Send + Sync {
    fn engine(&self) -> WebSearchEngine;

    async fn search(&self, query: &str) -> Result<SearchResult, SieveError>;
}

pub struct HeadlessSearchService {
    engine: WebSearchEngine,
    renderer: Arc<dyn PageRenderer>,
    timeout: Duration,
}

impl HeadlessSearchService {
    pub fn new(engine: WebSearchEngine, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            engine,
            renderer,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SearchService for HeadlessSearchService {
    fn engine(&self) -> WebSearchEngine {
        self.engine
    }

    async fn search(&self, query: &str) -> Result<SearchResult, SieveError> {
        let started = Instant::now();
        let page_url = self.engine.query_url(query)?;
        debug!(target: "sieve.search", engine = %self.engine, url = %page_url, "rendering results page");

        // Results pages are read as soon as the first response arrives.
        let ready = |_: &Html| true;
        let markup = self
            .renderer
            .fetch(&page_url, &ready, self.timeout)
            .await
            .map_err(|source| SieveError::Fetch {
                url: page_url.to_string(),
                source,
            })?;

        let result = parse_results_page(self.engine, &markup, &page_url)?;
        info!(
            target: "sieve.search",
            engine = %self.engine,
            results = result.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search complete"
        );
        Ok(result)
    }
}

/// Read result entries off a raw results page.
pub fn parse_results_page(
    engine: WebSearchEngine,
    markup: &str,
    page_url: &Url,
) -> Result<SearchResult, SieveError> {
    let page = sanitize(markup, page_url)?;
    let web_pages = engine.layout().parse_results(&page.document, page_url);
    Ok(SearchResult { web_pages })
}

/// Public search entry point.
#[derive(Clone)]
pub struct WebSearchService {
    service: Arc<dyn SearchService>,
}

impl WebSearchService {
    /// Search `engine` through a headless results-page render.
    pub fn new(engine: WebSearchEngine, renderer: Arc<dyn PageRenderer>, timeout: Duration) -> Self {
        Self::from_service(Arc::new(
            HeadlessSearchService::new(engine, renderer).with_timeout(timeout),
        ))
    }

    pub fn from_service(service: Arc<dyn SearchService>) -> Self {
        Self { service }
    }

    pub fn engine(&self) -> WebSearchEngine {
        self.service.engine()
    }

    pub async fn search(&self, query: &str) -> Result<SearchResult, SieveError> {
        self.service.search(query).await
    }
}
