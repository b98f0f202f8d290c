//! MCP (Model Context Protocol) server module.
//!
//! Exposes the Python editing and symbol lookup tools over JSON-RPC 2.0
//! on stdio.

pub mod server;
pub mod tools;
pub mod types;

pub use server::McpServer;
pub use tools::{call_tool, list_tools, ToolContext, EDIT_TOOL, LOCATE_TOOL};
