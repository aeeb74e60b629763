// src/error.rs
use serde_json::json;
use std::time::Duration;

/// Failure reported by a [`PageRenderer`](crate::render::PageRenderer) while
/// loading a single URL.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("render error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SieveError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: RenderError,
    },

    #[error("Failed to parse markup from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("Failed to extract content from {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Method not found")]
    MethodNotFound,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl SieveError {
    /// Per-URL failures that the loader logs and drops instead of aborting
    /// the whole batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SieveError::Parse { .. } | SieveError::Extraction { .. })
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            SieveError::InvalidUrl(_) => "invalid_url",
            SieveError::Fetch {
                source: RenderError::Timeout(_),
                ..
            } => "render_timeout",
            SieveError::Fetch { .. } => "fetch_failed",
            SieveError::Parse { .. } => "parse_error",
            SieveError::Extraction { .. } => "extraction_failed",
            SieveError::InvalidInput(_) => "invalid_input",
            SieveError::MethodNotFound => "method_not_found",
            SieveError::Config(_) => "invalid_config",
            SieveError::Internal(_) | SieveError::Io(_) | SieveError::SerdeJson(_) => {
                "internal_error"
            }
        }
    }

    pub fn to_jsonrpc_error(&self) -> serde_json::Value {
        let (code, message) = match self {
            SieveError::InvalidUrl(_) | SieveError::InvalidInput(_) => (-32602, self.to_string()),
            SieveError::MethodNotFound => (-32601, "Method not found".to_string()),
            SieveError::SerdeJson(_) => (-32700, "Parse error".to_string()),
            err => (-32603, err.to_string()),
        };

        json!({
            "code": code,
            "message": message,
            "data": { "kind": self.code_str() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_split() {
        let parse = SieveError::Parse {
            url: "https://example.com".into(),
            reason: "binary payload".into(),
        };
        let fetch = SieveError::Fetch {
            url: "https://example.com".into(),
            source: RenderError::Status { status: 503 },
        };
        assert!(parse.is_recoverable());
        assert!(!fetch.is_recoverable());
        assert!(!SieveError::InvalidUrl("nope".into()).is_recoverable());
    }

    #[test]
    fn test_codes() {
        let timeout = SieveError::Fetch {
            url: "https://example.com".into(),
            source: RenderError::Timeout(Duration::from_secs(20)),
        };
        assert_eq!(timeout.code_str(), "render_timeout");

        let rpc = SieveError::InvalidUrl("ftp://x".into()).to_jsonrpc_error();
        assert_eq!(rpc["code"], -32602);
        assert_eq!(rpc["data"]["kind"], "invalid_url");
        assert_eq!(SieveError::MethodNotFound.to_jsonrpc_error()["code"], -32601);
    }
}
