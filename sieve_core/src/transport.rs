use serde_json::Value;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::mcp_server::JsonRpcHandler;

/// Line-delimited JSON-RPC over stdio for the MCP server
pub struct StdioTransport {
    handler: JsonRpcHandler,
}

impl StdioTransport {
    pub fn new(handler: JsonRpcHandler) -> Self {
        Self { handler }
    }

    /// Serve requests from stdin until EOF, writing responses to stdout
    pub async fn run(&self) -> io::Result<()> {
        info!(target: "sieve.mcp", "Starting stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve requests from any line-oriented reader. Messages are handled
    /// one at a time, in arrival order.
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(input).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.process_line(&line).await {
                write_response(&mut output, &response).await?;
            }
        }

        debug!(target: "sieve.mcp", "EOF reached on input");
        Ok(())
    }

    async fn process_line(&self, line: &str) -> Option<Value> {
        debug!(target: "sieve.mcp", "Processing line: {}", line);

        match serde_json::from_str::<Value>(line) {
            Ok(request) => self.handler.handle_request(request).await,
            Err(e) => {
                error!(target: "sieve.mcp", "Failed to parse JSON-RPC request: {}", e);
                Some(serde_json::json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": -32700,
                        "message": "Parse error",
                        "data": e.to_string()
                    },
                    "id": null
                }))
            }
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(output: &mut W, response: &Value) -> io::Result<()> {
    let response_str = serde_json::to_string(response)?;

    output.write_all(response_str.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;

    debug!(target: "sieve.mcp", "Sent response: {}", response_str);
    Ok(())
}
