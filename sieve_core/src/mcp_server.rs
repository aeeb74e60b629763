use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SieveConfig;
use crate::error::SieveError;
use crate::loader::{parse_target_url, WebLoader};
use crate::render::PageRenderer;
use crate::search::{WebSearchEngine, WebSearchService};
use crate::types::{to_sorted_json, PageResult, WebPage};
use rmcp::model::*;

pub const WEB_SEARCH_TOOL: &str = "web_search";
pub const READ_WEB_PAGE_TOOL: &str = "read_web_page";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchToolOutput<'a> {
    description: String,
    query: &'a str,
    web_pages: &'a [WebPage],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadToolOutput<'a> {
    description: String,
    web_pages: &'a [PageResult],
}

/// MCP server exposing web search and page reading as tools.
pub struct McpServer {
    config: SieveConfig,
    renderer: Arc<dyn PageRenderer>,
    loader: WebLoader,
}

impl McpServer {
    pub fn new(config: SieveConfig, renderer: Arc<dyn PageRenderer>) -> Result<Self, SieveError> {
        let loader = WebLoader::from_config(Arc::clone(&renderer), &config)?;
        Ok(Self {
            config,
            renderer,
            loader,
        })
    }

    pub fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(true),
            }),
            ..Default::default()
        }
    }

    pub async fn handle_initialize(
        &self,
        request: InitializeRequestParam,
    ) -> Result<InitializeResult, SieveError> {
        info!(
            target: "sieve.mcp",
            client = %request.client_info.name,
            engine = %self.config.engine,
            "MCP server initializing"
        );

        Ok(InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: self.capabilities(),
            server_info: Implementation {
                name: "sieve".to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Search the web and read web pages. Use web_search to find pages, then read_web_page to fetch their main content."
                    .to_string(),
            ),
        })
    }

    pub async fn handle_list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, SieveError> {
        let engines: Vec<&str> = WebSearchEngine::ALL.iter().map(|e| e.as_str()).collect();

        let search = Tool {
            name: WEB_SEARCH_TOOL.into(),
            title: None,
            description: Some(
                "Search a query and return structured results (title, URL, snippet)".into(),
            ),
            input_schema: Arc::new(object_schema(json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "engine": {
                        "type": "string",
                        "enum": engines,
                        "description": "Search engine to use; defaults to the server's configured engine"
                    }
                },
                "required": ["query"]
            }))?),
            output_schema: None,
            annotations: None,
            icons: None,
        };

        let read = Tool {
            name: READ_WEB_PAGE_TOOL.into(),
            title: None,
            description: Some("Fetch the main content of a web page by URL".into()),
            input_schema: Arc::new(object_schema(json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL to read"
                    },
                    "timeout_secs": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Give up and return what has loaded after this many seconds"
                    }
                },
                "required": ["url"]
            }))?),
            output_schema: None,
            annotations: None,
            icons: None,
        };

        Ok(ListToolsResult {
            tools: vec![search, read],
            next_cursor: None,
        })
    }

    /// Tool failures come back as `is_error` results so the calling model
    /// can see them; only protocol problems are JSON-RPC errors.
    pub async fn handle_call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, SieveError> {
        let args = request.arguments.unwrap_or_default();
        info!(target: "sieve.mcp", tool = %request.name, "tool call");

        match &*request.name {
            WEB_SEARCH_TOOL => {
                let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");
                match self.web_search(query, args.get("engine")).await {
                    Ok(text) => Ok(CallToolResult::success(text.into_contents())),
                    Err(e) => Ok(tool_error(format!("Search error: {}", e))),
                }
            }
            READ_WEB_PAGE_TOOL => {
                let raw_url = args.get("url").and_then(|v| v.as_str()).unwrap_or("");
                let url = match parse_target_url(raw_url) {
                    Ok(url) => url,
                    Err(_) => return Ok(tool_error(format!("Invalid URL: {}", raw_url))),
                };
                let timeout = args
                    .get("timeout_secs")
                    .and_then(|v| v.as_u64())
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| self.config.timeout());

                match self.read_web_page(url, raw_url, timeout).await {
                    Ok(text) => Ok(CallToolResult::success(text.into_contents())),
                    Err(e) => Ok(tool_error(format!("Scrap error: {}", e))),
                }
            }
            other => Ok(tool_error(format!("Unknown tool: {}", other))),
        }
    }

    async fn web_search(&self, query: &str, engine: Option<&Value>) -> Result<String, SieveError> {
        let engine = match engine.and_then(|v| v.as_str()) {
            Some(name) => name.parse()?,
            None => self.config.engine,
        };
        let service = WebSearchService::new(engine, Arc::clone(&self.renderer), self.config.timeout());
        let result = service.search(query).await?;

        Ok(to_sorted_json(&SearchToolOutput {
            description: format!(
                "Found {} results for query '{}'",
                result.web_pages.len(),
                query
            ),
            query,
            web_pages: &result.web_pages,
        })?)
    }

    async fn read_web_page(
        &self,
        url: url::Url,
        raw_url: &str,
        timeout: Duration,
    ) -> Result<String, SieveError> {
        let pages = self.loader.load(&[url], timeout).await?;
        Ok(to_sorted_json(&ReadToolOutput {
            description: format!("Scraped web page of {}", raw_url),
            web_pages: &pages,
        })?)
    }
}

fn tool_error(message: String) -> CallToolResult {
    warn!(target: "sieve.mcp", "{}", message);
    CallToolResult::error(message.into_contents())
}

fn object_schema(value: Value) -> Result<JsonObject, SieveError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SieveError::Internal("tool schema must be a JSON object".to_string())),
    }
}

/// JSON-RPC message handler for the MCP server
pub struct JsonRpcHandler {
    server: McpServer,
}

impl JsonRpcHandler {
    pub fn new(server: McpServer) -> Self {
        Self { server }
    }

    /// Process a JSON-RPC message. Notifications (no `id`) get no response.
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let Some(id) = request.get("id").cloned() else {
            debug!(target: "sieve.mcp", method, "notification received");
            return None;
        };
        let params = request.get("params").cloned().unwrap_or(json!({}));
        debug!(target: "sieve.mcp", method, id = %id, "handling request");

        let result = match method {
            "initialize" => match serde_json::from_value::<InitializeRequestParam>(params) {
                Ok(req) => self
                    .server
                    .handle_initialize(req)
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(SieveError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                Err(e) => Err(SieveError::InvalidInput(e.to_string()).to_jsonrpc_error()),
            },
            "ping" => Ok(json!({})),
            "tools/list" => match serde_json::from_value::<Option<PaginatedRequestParam>>(params) {
                Ok(req) => self
                    .server
                    .handle_list_tools(req)
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(SieveError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                Err(e) => Err(SieveError::InvalidInput(e.to_string()).to_jsonrpc_error()),
            },
            "tools/call" => match serde_json::from_value::<CallToolRequestParam>(params) {
                Ok(req) => self
                    .server
                    .handle_call_tool(req)
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(SieveError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                Err(e) => Err(SieveError::InvalidInput(e.to_string()).to_jsonrpc_error()),
            },
            _ => Err(SieveError::MethodNotFound.to_jsonrpc_error()),
        };

        Some(match result {
            Ok(result) => json!({
                "jsonrpc": "2.0",
                "result": result,
                "id": id,
            }),
            Err(error) => json!({
                "jsonrpc": "2.0",
                "error": error,
                "id": id,
            }),
        })
    }
}
