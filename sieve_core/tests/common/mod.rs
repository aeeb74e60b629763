#![allow(dead_code)]

use async_trait::async_trait;
use scraper::Html;
use sieve_core::{PageRenderer, Readiness, RenderError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// What the scripted renderer does for one URL.
#[derive(Clone)]
pub enum Script {
    Page { after: Duration, markup: String },
    Fail { after: Duration, status: u16 },
}

pub fn page(after_secs: u64, markup: &str) -> Script {
    Script::Page {
        after: Duration::from_secs(after_secs),
        markup: markup.to_string(),
    }
}

pub fn failure(after_secs: u64, status: u16) -> Script {
    Script::Fail {
        after: Duration::from_secs(after_secs),
        status,
    }
}

pub fn article(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body><nav>menu</nav><article><p>{body}</p></article></body></html>"
    )
}

/// Serves canned markup after a fixed latency, recording every fetch that
/// started, every fetch that ran to completion, and the readiness verdict
/// the caller's predicate gave each served page.
#[derive(Default)]
pub struct ScriptedRenderer {
    scripts: HashMap<String, Script>,
    pub started: Mutex<Vec<String>>,
    pub finished: Mutex<Vec<String>>,
    pub readiness: Mutex<Vec<(String, bool)>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, script: Script) -> Self {
        let key = Url::parse(url).expect("test url").to_string();
        self.scripts.insert(key, script);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    /// Verdicts sorted by URL.
    pub fn readiness(&self) -> Vec<(String, bool)> {
        let mut verdicts = self.readiness.lock().unwrap().clone();
        verdicts.sort();
        verdicts
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn fetch(
        &self,
        url: &Url,
        ready: Readiness<'_>,
        _timeout: Duration,
    ) -> Result<String, RenderError> {
        self.started.lock().unwrap().push(url.to_string());
        let script = self
            .scripts
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| RenderError::Other(format!("no script for {}", url)))?;

        let outcome = match script {
            Script::Page { after, markup } => {
                tokio::time::sleep(after).await;
                let verdict = ready(&Html::parse_document(&markup));
                self.readiness
                    .lock()
                    .unwrap()
                    .push((url.to_string(), verdict));
                Ok(markup)
            }
            Script::Fail { after, status } => {
                tokio::time::sleep(after).await;
                Err(RenderError::Status { status })
            }
        };
        self.finished.lock().unwrap().push(url.to_string());
        outcome
    }
}

pub fn urls(raw: &[&str]) -> Vec<Url> {
    raw.iter().map(|u| Url::parse(u).expect("test url")).collect()
}
