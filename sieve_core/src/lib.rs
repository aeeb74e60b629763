// src/lib.rs
//! Web search and main-content extraction.
//!
//! Pages are rendered through a [`PageRenderer`], stripped of noise by the
//! sanitizer and reduced to their readable content by a
//! [`ContentStrategy`]. [`WebLoader`] does this for many URLs at once under
//! a shared deadline; [`WebSearchService`] reads result lists off search
//! engine pages. The same operations are exposed as MCP tools by
//! [`mcp_server::McpServer`].

pub mod config;
pub mod deadline;
pub mod error;
pub mod loader;
pub mod mcp_server;
pub mod render;
pub mod sanitize;
pub mod search;
pub mod strategy;
pub mod transport;
pub mod types;

pub use config::{ContentFormat, SieveConfig, StrategyRule};
pub use error::{RenderError, SieveError};
pub use loader::{parse_target_url, WebLoader};
pub use render::{HttpRenderer, PageRenderer, Readiness};
pub use search::{HeadlessSearchService, SearchService, WebSearchEngine, WebSearchService};
pub use strategy::{ContentStrategy, DefaultStrategy, SelectorStrategy, StrategyRegistry};
pub use types::{PageResult, SearchResult, WebPage};

// Re-export types from rmcp that tool hosts might need
pub use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, InitializeRequestParam,
    InitializeResult, ListToolsResult, ServerCapabilities, Tool,
};
