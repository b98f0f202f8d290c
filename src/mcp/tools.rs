//! MCP tool implementations: `edit-python-code` and `locate-python-symbol`.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{ToolDefinition, ToolsCallResult};
use crate::edit::{edit_file, EditPosition, EditRequest};
use crate::error::{HelperError, Result};
use crate::locate::{locate_symbol, SymbolLocator};

pub const EDIT_TOOL: &str = "edit-python-code";
pub const LOCATE_TOOL: &str = "locate-python-symbol";

/// State shared by tool calls.
#[derive(Clone)]
pub struct ToolContext {
    locator: Arc<dyn SymbolLocator>,
}

impl ToolContext {
    pub fn new(locator: Arc<dyn SymbolLocator>) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &dyn SymbolLocator {
        self.locator.as_ref()
    }
}

/// Return the list of all available tools with their JSON schemas.
pub fn list_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: EDIT_TOOL.to_string(),
            description: "Edit Python code by inserting or replacing code at a specified location"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Full path to the Python file to edit"
                    },
                    "code": {
                        "type": "string",
                        "description": "Valid Python code to insert"
                    },
                    "target": {
                        "type": "string",
                        "description": "Symbol name or full line of code to target. E.g., 'var = 3', \
                            'my_function', 'MyClass.my_method', 'MY_CONSTANT'"
                    },
                    "position": {
                        "type": "string",
                        "enum": ["before", "after", "replace"],
                        "description": "Where to insert the code relative to the target"
                    }
                },
                "required": ["filename", "code", "target", "position"]
            }),
        },
        ToolDefinition {
            name: LOCATE_TOOL.to_string(),
            description: "Locate the definition of a Python symbol in the codebase".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "symbol": {
                        "type": "string",
                        "description": "Name of the symbol to locate (e.g. 'MyClass', 'my_function')"
                    },
                    "workspace_root": {
                        "type": "string",
                        "description": "Root directory of the Python project"
                    }
                },
                "required": ["symbol", "workspace_root"]
            }),
        },
    ]
}

/// Dispatch a tool call to the appropriate handler.
pub async fn call_tool(ctx: &ToolContext, name: &str, arguments: &Value) -> ToolsCallResult {
    match name {
        EDIT_TOOL => handle_edit(arguments).await,
        LOCATE_TOOL => handle_locate(ctx, arguments).await,
        _ => {
            warn!(tool = name, "unknown tool");
            ToolsCallResult::error(format!("Unknown tool: {}", name))
        }
    }
}

async fn handle_edit(args: &Value) -> ToolsCallResult {
    let (filename, request) = match edit_arguments(args) {
        Ok(parsed) => parsed,
        Err(e) => return ToolsCallResult::error(e.to_string()),
    };
    let summary = format!(
        "Successfully modified {} - {} {}",
        filename, request.position, request.target
    );

    let path = PathBuf::from(filename);
    let outcome = tokio::task::spawn_blocking(move || edit_file(&path, &request))
        .await
        .unwrap_or_else(|e| Err(HelperError::Io(std::io::Error::other(e))));

    match outcome {
        Ok(_) => ToolsCallResult::text(summary),
        Err(e) => {
            debug!(filename, error = %e, "edit failed");
            ToolsCallResult::error(format!("Error modifying code: {}", e))
        }
    }
}

async fn handle_locate(ctx: &ToolContext, args: &Value) -> ToolsCallResult {
    let (symbol, root) = match locate_arguments(args) {
        Ok(parsed) => parsed,
        Err(e) => return ToolsCallResult::error(e.to_string()),
    };

    match locate_symbol(ctx.locator(), Path::new(root), symbol).await {
        Ok(text) => ToolsCallResult::text(text),
        Err(e) => {
            debug!(symbol, root, error = %e, "locate failed");
            ToolsCallResult::error(format!("Error locating symbol: {}", e))
        }
    }
}

fn edit_arguments(args: &Value) -> Result<(&str, EditRequest)> {
    let filename = required_str(args, "filename")?;
    let request = EditRequest {
        code: required_str(args, "code")?.to_string(),
        target: required_str(args, "target")?.to_string(),
        position: required_str(args, "position")?.parse::<EditPosition>()?,
    };
    Ok((filename, request))
}

fn locate_arguments(args: &Value) -> Result<(&str, &str)> {
    Ok((
        required_str(args, "symbol")?,
        required_str(args, "workspace_root")?,
    ))
}

/// A present, non-empty string argument.
fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    match args.get(key) {
        None | Some(Value::Null) => Err(HelperError::InvalidArguments(format!(
            "missing required argument '{}'",
            key
        ))),
        Some(Value::String(s)) if s.trim().is_empty() => Err(HelperError::InvalidArguments(
            format!("argument '{}' must not be empty", key),
        )),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(HelperError::InvalidArguments(format!(
            "argument '{}' must be a string",
            key
        ))),
    }
}
