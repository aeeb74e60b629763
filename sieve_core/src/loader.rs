//! Concurrent multi-URL page loading under one shared deadline.
//!
//! Every URL becomes its own task: render, sanitize, extract. The
//! coordinator collects finished pages in completion order until either all
//! tasks have settled or the deadline fires, whichever happens first. Work
//! still running at that point is cancelled and whatever finished is
//! returned.
//!
//! Failure handling is deliberately asymmetric. A render failure on any URL
//! fails the whole batch; a page that cannot be parsed or yields no content
//! is logged and left out.

use crate::config::{ContentFormat, SieveConfig};
use crate::deadline::Deadline;
use crate::error::SieveError;
use crate::render::PageRenderer;
use crate::sanitize::{sanitize, SanitizedPage};
use crate::strategy::{ContentStrategy, StrategyRegistry};
use crate::types::PageResult;
use scraper::Html;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

pub struct WebLoader {
    renderer: Arc<dyn PageRenderer>,
    strategies: StrategyRegistry,
    format: ContentFormat,
}

/// What the coordinator observed on one turn of its loop.
enum LoadEvent {
    Completed(PageResult),
    Dropped(SieveError),
    Failed(SieveError),
    Drained,
    DeadlineExpired,
}

impl LoadEvent {
    fn from_join(joined: Option<Result<Result<PageResult, SieveError>, JoinError>>) -> Self {
        match joined {
            None => LoadEvent::Drained,
            Some(Ok(Ok(page))) => LoadEvent::Completed(page),
            Some(Ok(Err(err))) if err.is_recoverable() => LoadEvent::Dropped(err),
            Some(Ok(Err(err))) => LoadEvent::Failed(err),
            Some(Err(join_err)) => {
                LoadEvent::Failed(SieveError::Internal(format!("load task failed: {}", join_err)))
            }
        }
    }
}

impl WebLoader {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            renderer,
            strategies: StrategyRegistry::default(),
            format: ContentFormat::default(),
        }
    }

    /// A loader with the strategies and content format from `config`.
    pub fn from_config(
        renderer: Arc<dyn PageRenderer>,
        config: &SieveConfig,
    ) -> Result<Self, SieveError> {
        Ok(Self::new(renderer)
            .with_strategies(config.strategy_registry()?)
            .with_format(config.content_format))
    }

    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_format(mut self, format: ContentFormat) -> Self {
        self.format = format;
        self
    }

    /// Validate raw inputs, then [`load`](Self::load) them. Nothing is
    /// fetched if any input is not an absolute http(s) URL.
    pub async fn load_strs<S: AsRef<str>>(
        &self,
        inputs: &[S],
        timeout: Duration,
    ) -> Result<Vec<PageResult>, SieveError> {
        let urls = inputs
            .iter()
            .map(|input| parse_target_url(input.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.load(&urls, timeout).await
    }

    /// Load every URL concurrently, returning the pages that finished within
    /// `timeout`, in the order they finished.
    ///
    /// Repeated URLs are loaded once. An empty input returns immediately.
    pub async fn load(
        &self,
        urls: &[Url],
        timeout: Duration,
    ) -> Result<Vec<PageResult>, SieveError> {
        let targets = unique(urls);
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        if timeout.is_zero() {
            return Err(SieveError::InvalidInput(
                "timeout must be greater than zero".to_string(),
            ));
        }

        let started = Instant::now();
        let deadline = Deadline::after(timeout);
        let expired = deadline.sleep();
        tokio::pin!(expired);

        let mut units = JoinSet::new();
        for url in targets.iter().cloned() {
            let renderer = Arc::clone(&self.renderer);
            let strategy = self.strategies.strategy_for(&url);
            units.spawn(load_one(renderer, strategy, url, deadline, self.format));
        }

        let requested = targets.len();
        let mut pages = Vec::with_capacity(requested);
        let mut dropped = 0usize;

        loop {
            let event = tokio::select! {
                biased;
                _ = &mut expired => LoadEvent::DeadlineExpired,
                joined = units.join_next() => LoadEvent::from_join(joined),
            };

            match event {
                LoadEvent::Completed(page) => {
                    debug!(target: "sieve.loader", url = %page.url, "page loaded");
                    pages.push(page);
                }
                LoadEvent::Dropped(err) => {
                    dropped += 1;
                    warn!(target: "sieve.loader", code = err.code_str(), "dropping page: {}", err);
                }
                LoadEvent::Failed(err) => {
                    units.abort_all();
                    warn!(target: "sieve.loader", code = err.code_str(), "batch failed: {}", err);
                    return Err(err);
                }
                LoadEvent::Drained => break,
                LoadEvent::DeadlineExpired => {
                    info!(
                        target: "sieve.loader",
                        budget_ms = deadline.budget().as_millis() as u64,
                        pending = units.len(),
                        "deadline reached, returning partial results"
                    );
                    break;
                }
            }
        }

        units.abort_all();
        debug!(
            target: "sieve.loader",
            requested,
            loaded = pages.len(),
            dropped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "load finished"
        );
        Ok(pages)
    }
}

async fn load_one(
    renderer: Arc<dyn PageRenderer>,
    strategy: Arc<dyn ContentStrategy>,
    url: Url,
    deadline: Deadline,
    format: ContentFormat,
) -> Result<PageResult, SieveError> {
    let ready = |document: &Html| strategy.is_page_ready(document);
    let markup = renderer
        .fetch(&url, &ready, deadline.remaining())
        .await
        .map_err(|source| SieveError::Fetch {
            url: url.to_string(),
            source,
        })?;

    process_page(&markup, url, strategy.as_ref(), format)
}

/// Turn rendered markup into a [`PageResult`]: sanitize, pick the title,
/// extract the main content.
pub fn process_page(
    markup: &str,
    url: Url,
    strategy: &dyn ContentStrategy,
    format: ContentFormat,
) -> Result<PageResult, SieveError> {
    let SanitizedPage { title, document } = sanitize(markup, &url)?;
    let content = strategy
        .extract_main_content(&document)
        .ok_or_else(|| SieveError::Extraction {
            url: url.to_string(),
            reason: format!("strategy '{}' found no main content", strategy.name()),
        })?;

    Ok(PageResult {
        title,
        url,
        content: format.render(&content),
    })
}

/// Accepts only absolute `http`/`https` URLs with a host.
pub fn parse_target_url(input: &str) -> Result<Url, SieveError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| SieveError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        "http" | "https" => Err(SieveError::InvalidUrl(format!("{}: missing host", trimmed))),
        other => Err(SieveError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            trimmed, other
        ))),
    }
}

fn unique(urls: &[Url]) -> Vec<Url> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}
