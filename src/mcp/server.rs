//! MCP JSON-RPC 2.0 server: reads requests from stdin, writes responses to stdout.
//!
//! The MCP stdio transport is newline-delimited JSON. Tracing output goes
//! to stderr so it doesn't interfere with the protocol. Requests are
//! handled one at a time in arrival order.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use super::tools::{self, ToolContext};
use super::types::*;
use crate::error::Result;

pub struct McpServer {
    name: String,
    tools: ToolContext,
}

impl McpServer {
    pub fn new(name: impl Into<String>, tools: ToolContext) -> Self {
        Self {
            name: name.into(),
            tools,
        }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn run_stdio(&self) -> Result<()> {
        self.run_with_io(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, answering on
    /// `writer`. Returns on EOF after shutting the symbol locator down.
    pub async fn run_with_io<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.name, "MCP server starting");
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            debug!(request = %trimmed, "received message");

            let response = match parse_request(trimmed) {
                Ok(request) => self.handle_request(&request).await,
                Err(response) => Some(response),
            };
            if let Some(response) = response {
                write_response(&mut writer, &response).await?;
            }
        }

        info!("stdin closed, MCP server shutting down");
        if let Err(e) = self.tools.locator().shutdown().await {
            warn!(error = %e, "symbol locator did not shut down cleanly");
        }
        Ok(())
    }

    /// Handle one message; `None` for notifications.
    pub async fn handle_request(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            match request.method.as_str() {
                "notifications/initialized" => info!("client initialized"),
                other => debug!(method = other, "notification ignored"),
            }
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => {
                let client = request
                    .params
                    .pointer("/clientInfo/name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                info!(client, "client initializing");
                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: ToolCapability {
                            list_changed: false,
                        },
                    },
                    server_info: ServerInfo {
                        name: self.name.clone(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                };
                to_response(id, &result)
            }

            "ping" => JsonRpcResponse::success(id, json!({})),

            "tools/list" => {
                debug!("listing tools");
                let result = ToolsListResult {
                    tools: tools::list_tools(),
                };
                to_response(id, &result)
            }

            "tools/call" => {
                let params: ToolsCallParams = match serde_json::from_value(request.params.clone()) {
                    Ok(p) => p,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(
                            id,
                            error_codes::INVALID_PARAMS,
                            format!("Invalid params: {}", e),
                        ));
                    }
                };

                debug!(tool = %params.name, "calling tool");
                let result = tools::call_tool(&self.tools, &params.name, &params.arguments).await;
                if result.is_error() {
                    warn!(tool = %params.name, message = %result.joined_text(), "tool call failed");
                }
                to_response(id, &result)
            }

            _ => {
                warn!(method = %request.method, "unknown method");
                JsonRpcResponse::error(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", request.method),
                )
            }
        };
        Some(response)
    }
}

fn parse_request(line: &str) -> std::result::Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        warn!(error = %e, "unparsable message");
        JsonRpcResponse::error(None, error_codes::PARSE_ERROR, format!("Parse error: {}", e))
    })?;
    let id = value.get("id").cloned();
    serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "invalid JSON-RPC request");
        JsonRpcResponse::error(
            id,
            error_codes::INVALID_REQUEST,
            format!("Invalid request: {}", e),
        )
    })
}

fn to_response<T: serde::Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!(error = %e, "failed to serialize result");
            JsonRpcResponse::error(
                id,
                error_codes::INTERNAL_ERROR,
                format!("Internal error: {}", e),
            )
        }
    }
}

/// Write a JSON-RPC response as one line and flush.
async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(response)?;
    debug!(response = %json, "sending response");
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
