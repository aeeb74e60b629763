//! Page rendering: turning a URL into raw markup.
//!
//! The loader and the search services only see the [`PageRenderer`] trait.
//! [`HttpRenderer`] is the stock implementation; it performs plain HTTP GETs
//! and re-polls until the readiness predicate accepts the document, so it
//! suits static pages. A JavaScript-capable engine plugs in behind the same
//! trait.

use crate::config::SieveConfig;
use crate::deadline::with_deadline;
use crate::error::{RenderError, SieveError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::Html;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Decides whether a rendered document has loaded enough to extract from.
pub type Readiness<'a> = &'a (dyn Fn(&Html) -> bool + Send + Sync);

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load `url` and return its markup once `ready` accepts the document.
    ///
    /// Fails with [`RenderError::Timeout`] when the page is not ready within
    /// `timeout`, or with another [`RenderError`] on transport failure.
    async fn fetch(
        &self,
        url: &Url,
        ready: Readiness<'_>,
        timeout: Duration,
    ) -> Result<String, RenderError>;
}

pub struct HttpRenderer {
    client: reqwest::Client,
    poll_interval: Duration,
}

impl HttpRenderer {
    pub fn new(config: &SieveConfig) -> Result<Self, SieveError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(2)
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .cookie_store(true)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| SieveError::Internal(format!("failed to build http client: {}", e)))?;

        Ok(Self::with_client(client, config.poll_interval()))
    }

    pub fn with_client(client: reqwest::Client, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    async fn get_markup(&self, url: &Url) -> Result<String, RenderError> {
        let t0 = Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                status: status.as_u16(),
            });
        }
        let t1 = Instant::now();
        let body = resp.text().await?;
        let t2 = Instant::now();

        debug!(
            target: "sieve.render",
            url = %url,
            connect_send_ms = %((t1 - t0).as_millis()),
            read_body_ms = %((t2 - t1).as_millis()),
            body_bytes = body.len(),
            "fetched markup"
        );
        Ok(body)
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn fetch(
        &self,
        url: &Url,
        ready: Readiness<'_>,
        timeout: Duration,
    ) -> Result<String, RenderError> {
        let load = || self.get_markup(url);
        with_deadline(timeout, poll_until_ready(url, ready, self.poll_interval, load)).await?
    }
}

/// Call `load` until `ready` accepts the markup it returns, sleeping
/// `interval` between attempts. A load error ends the polling.
async fn poll_until_ready<F, Fut>(
    url: &Url,
    ready: Readiness<'_>,
    interval: Duration,
    mut load: F,
) -> Result<String, RenderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, RenderError>>,
{
    let mut attempt = 1u32;
    loop {
        let markup = load().await?;
        if markup_is_ready(&markup, ready) {
            return Ok(markup);
        }
        debug!(
            target: "sieve.render",
            url = %url,
            attempt,
            "page not ready; polling again"
        );
        attempt += 1;
        tokio::time::sleep(interval).await;
    }
}

fn markup_is_ready(markup: &str, ready: Readiness<'_>) -> bool {
    let document = Html::parse_document(markup);
    ready(&document)
}
