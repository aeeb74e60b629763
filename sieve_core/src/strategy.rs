//! Main-content extraction strategies.
//!
//! A [`ContentStrategy`] decides when a rendered page is ready and which part
//! of a sanitized document is the readable content. [`StrategyRegistry`]
//! picks a strategy per URL from regex patterns, falling back to
//! [`DefaultStrategy`].

use crate::config::StrategyRule;
use crate::error::SieveError;
use crate::sanitize::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub trait ContentStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// The readable content of `document`, or `None` when nothing
    /// extractable was found.
    fn extract_main_content(&self, document: &Html) -> Option<String>;

    /// Whether a dynamically rendered page has finished loading.
    fn is_page_ready(&self, document: &Html) -> bool;
}

/// Ordered fallback over structural markers: `<article>`, `#main-content`,
/// `.page-body`, `<main>`, then the body's plain text, then the whole
/// serialized document. Always ready.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStrategy;

impl ContentStrategy for DefaultStrategy {
    fn name(&self) -> &str {
        "default"
    }

    fn extract_main_content(&self, document: &Html) -> Option<String> {
        Some(default_main_content(document))
    }

    fn is_page_ready(&self, _document: &Html) -> bool {
        true
    }
}

static MARKERS: Lazy<[Selector; 4]> = Lazy::new(|| {
    ["article", "#main-content", ".page-body", "main"]
        .map(|s| Selector::parse(s).expect("static content selector"))
});

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("static body selector"));

/// The default extraction policy; first match wins.
pub fn default_main_content(document: &Html) -> String {
    for selector in MARKERS.iter() {
        if let Some(element) = document.select(selector).next() {
            return element.inner_html();
        }
    }

    match document.select(&BODY).next() {
        Some(body) => readable_text(body),
        None => document.html(),
    }
}

const BLOCK_TAGS: [&str; 29] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "p", "pre", "section", "td", "th", "tr",
];

/// Whitespace-normalized text of `element`, with block boundaries turned
/// into single spaces.
pub fn readable_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_text(element, &mut raw);
    collapse_whitespace(&raw)
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let block = BLOCK_TAGS.contains(&el.name());
                if block {
                    out.push(' ');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_text(child_el, out);
                }
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Extracts the first match of a CSS selector and, optionally, waits for a
/// marker element before reporting the page ready.
#[derive(Debug)]
pub struct SelectorStrategy {
    name: String,
    content: Selector,
    ready: Option<Selector>,
}

impl SelectorStrategy {
    pub fn new(content: &str, ready: Option<&str>) -> Result<Self, SieveError> {
        Ok(Self {
            name: format!("selector({content})"),
            content: parse_selector(content)?,
            ready: ready.map(parse_selector).transpose()?,
        })
    }
}

impl ContentStrategy for SelectorStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract_main_content(&self, document: &Html) -> Option<String> {
        document
            .select(&self.content)
            .next()
            .map(|element| element.inner_html())
    }

    fn is_page_ready(&self, document: &Html) -> bool {
        match &self.ready {
            Some(marker) => document.select(marker).next().is_some(),
            None => true,
        }
    }
}

fn parse_selector(source: &str) -> Result<Selector, SieveError> {
    Selector::parse(source)
        .map_err(|e| SieveError::InvalidInput(format!("invalid CSS selector '{}': {}", source, e)))
}

/// Maps URL patterns to extraction strategies.
///
/// Rules are tried in registration order; the first whose pattern matches
/// the full URL wins. Unmatched URLs get the fallback strategy.
pub struct StrategyRegistry {
    rules: Vec<(Regex, Arc<dyn ContentStrategy>)>,
    fallback: Arc<dyn ContentStrategy>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Arc::new(DefaultStrategy),
        }
    }

    pub fn from_rules(rules: &[StrategyRule]) -> Result<Self, SieveError> {
        let mut registry = Self::new();
        for rule in rules {
            let strategy =
                SelectorStrategy::new(&rule.content_selector, rule.ready_selector.as_deref())?;
            registry.register(&rule.pattern, Arc::new(strategy))?;
        }
        Ok(registry)
    }

    pub fn register(
        &mut self,
        pattern: &str,
        strategy: Arc<dyn ContentStrategy>,
    ) -> Result<(), SieveError> {
        let regex = Regex::new(pattern).map_err(|e| {
            SieveError::InvalidInput(format!("invalid URL pattern '{}': {}", pattern, e))
        })?;
        self.rules.push((regex, strategy));
        Ok(())
    }

    pub fn strategy_for(&self, url: &Url) -> Arc<dyn ContentStrategy> {
        let chosen = self
            .rules
            .iter()
            .find(|(pattern, _)| pattern.is_match(url.as_str()))
            .map(|(_, strategy)| Arc::clone(strategy))
            .unwrap_or_else(|| Arc::clone(&self.fallback));
        debug!(target: "sieve.strategy", url = %url, strategy = chosen.name(), "strategy selected");
        chosen
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
