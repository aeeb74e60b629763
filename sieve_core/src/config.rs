//! Runtime configuration.
//!
//! Values are layered, lowest precedence first: built-in defaults, the TOML
//! file, environment variables, then whatever the caller (CLI flags, MCP tool
//! arguments) sets explicitly on the loaded struct.

use crate::error::SieveError;
use crate::search::WebSearchEngine;
use crate::strategy::StrategyRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

pub const ENGINE_ENV: &str = "SEARCH_ENGINE";
pub const TIMEOUT_ENV: &str = "SIEVE_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SieveConfig {
    pub engine: WebSearchEngine,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub user_agent: String,
    pub content_format: ContentFormat,
    pub strategies: Vec<StrategyRule>,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            engine: WebSearchEngine::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            content_format: ContentFormat::default(),
            strategies: Vec::new(),
        }
    }
}

/// Site-specific extraction: URLs matching `pattern` (a regex) use
/// `content_selector` instead of the default fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyRule {
    pub pattern: String,
    pub content_selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_selector: Option<String>,
}

impl SieveConfig {
    /// `<config dir>/sieve/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sieve").join("config.toml"))
    }

    /// Load from `path` (or the default location when it exists), then apply
    /// the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SieveError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, SieveError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        debug!(target: "sieve.config", path = %path.display(), "configuration file loaded");
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, SieveError> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay environment values. Unusable values are logged and ignored so
    /// a stray variable never prevents startup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENGINE_ENV) {
            match WebSearchEngine::from_str(&raw) {
                Ok(engine) => self.engine = engine,
                Err(_) => warn!(
                    target: "sieve.config",
                    value = %raw,
                    fallback = %self.engine,
                    "unknown {} value, keeping configured engine", ENGINE_ENV
                ),
            }
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => warn!(
                    target: "sieve.config",
                    value = %raw,
                    "ignoring invalid {}", TIMEOUT_ENV
                ),
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn strategy_registry(&self) -> Result<StrategyRegistry, SieveError> {
        StrategyRegistry::from_rules(&self.strategies)
    }
}

/// Shape of the `content` field in loaded pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Extracted HTML, or plain text when the body fallback applied.
    #[default]
    Html,
    Markdown,
}

impl ContentFormat {
    pub fn render(&self, content: &str) -> String {
        match self {
            ContentFormat::Html => content.to_string(),
            ContentFormat::Markdown => {
                let converter = htmd::HtmlToMarkdown::builder()
                    .skip_tags(vec!["script", "style", "noscript", "svg"])
                    .build();
                converter
                    .convert(content)
                    .unwrap_or_else(|_| content.to_string())
            }
        }
    }
}

impl FromStr for ContentFormat {
    type Err = SieveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(ContentFormat::Html),
            "markdown" | "md" => Ok(ContentFormat::Markdown),
            other => Err(SieveError::InvalidInput(format!(
                "unknown content format '{}'; expected html or markdown",
                other
            ))),
        }
    }
}
