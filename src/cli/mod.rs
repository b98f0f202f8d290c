//! Command-line surface of `mcp-python-helper`.
//!
//! Commands:
//! - serve (default): MCP server on stdio
//! - locate, edit: run a tool once from the shell
//! - client-config: print the `mcpServers` entry for an MCP client

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::edit::{EditPosition, EditRequest};
use crate::error::{HelperError, Result};

/// Name under which the server is registered with MCP clients.
pub const SERVER_KEY: &str = "mcp-python-helper";

#[derive(Debug, Parser)]
#[command(name = "mcp-python-helper")]
#[command(version, about = "MCP server with tools to help with Python projects")]
pub struct Cli {
    /// Config file (default: $MCP_PYTHON_HELPER_CONFIG or ./mcp-python-helper.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,

    /// Locate the definition of a Python symbol
    Locate {
        /// Symbol name, e.g. MyClass or MyClass.my_method
        symbol: String,

        /// Project root (default: current directory)
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// Insert or replace code around a target in a Python file
    Edit(EditArgs),

    /// Print the MCP client configuration for this server
    ClientConfig {
        /// Emit a development entry running from this checkout via cargo
        #[arg(long, value_name = "DIR")]
        dev: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Python file to edit
    pub file: PathBuf,

    /// Symbol name or full line of code to target
    #[arg(short, long)]
    pub target: String,

    /// Where the code goes relative to the target
    #[arg(short, long, value_enum)]
    pub position: PositionArg,

    /// Code to insert
    #[arg(long, conflicts_with = "code_file", required_unless_present = "code_file")]
    pub code: Option<String>,

    /// Read the code to insert from a file ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub code_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PositionArg {
    Before,
    After,
    Replace,
}

impl From<PositionArg> for EditPosition {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Before => EditPosition::Before,
            PositionArg::After => EditPosition::After,
            PositionArg::Replace => EditPosition::Replace,
        }
    }
}

impl EditArgs {
    pub fn to_request(&self) -> Result<EditRequest> {
        let code = match (&self.code, &self.code_file) {
            (Some(code), _) => code.clone(),
            (None, Some(path)) if path.as_os_str() == "-" => std::io::read_to_string(std::io::stdin())?,
            (None, Some(path)) => fs::read_to_string(path)?,
            (None, None) => {
                return Err(HelperError::InvalidArguments(
                    "either --code or --code-file is required".to_string(),
                ))
            }
        };
        Ok(EditRequest {
            code,
            target: self.target.clone(),
            position: self.position.into(),
        })
    }
}

/// The `mcpServers` JSON an MCP client needs to launch this server.
///
/// Without `dev`, the installed binary is used. With `dev`, the server
/// is run from a source checkout through `cargo run`.
pub fn client_config(dev: Option<&Path>) -> Value {
    let entry = match dev {
        None => json!({"command": SERVER_KEY, "args": []}),
        Some(dir) => json!({
            "command": "cargo",
            "args": [
                "run",
                "--quiet",
                "--manifest-path",
                dir.join("Cargo.toml").display().to_string(),
                "--bin",
                SERVER_KEY,
                "--",
            ],
        }),
    };
    let mut servers = serde_json::Map::new();
    servers.insert(SERVER_KEY.to_string(), entry);
    json!({ "mcpServers": servers })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::try_parse_from(["mcp-python-helper"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_edit() {
        let cli = Cli::try_parse_from([
            "mcp-python-helper",
            "edit",
            "app.py",
            "--target",
            "MyClass.run",
            "--position",
            "after",
            "--code",
            "x = 1",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        let Some(Commands::Edit(args)) = cli.command else {
            panic!("expected edit command");
        };
        let request = args.to_request().unwrap();
        assert_eq!(request.target, "MyClass.run");
        assert_eq!(request.position, EditPosition::After);
        assert_eq!(request.code, "x = 1");
    }

    #[test]
    fn test_edit_requires_code() {
        let result = Cli::try_parse_from([
            "mcp-python-helper",
            "edit",
            "app.py",
            "-t",
            "f",
            "-p",
            "before",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_edit_code_file() {
        let dir = tempfile::tempdir().unwrap();
        let snippet = dir.path().join("snippet.py");
        fs::write(&snippet, "def extra():\n    pass\n").unwrap();

        let cli = Cli::try_parse_from([
            "mcp-python-helper",
            "edit",
            "app.py",
            "-t",
            "f",
            "-p",
            "replace",
            "--code-file",
            snippet.to_str().unwrap(),
        ])
        .unwrap();
        let Some(Commands::Edit(args)) = cli.command else {
            panic!("expected edit command");
        };
        assert_eq!(args.to_request().unwrap().code, "def extra():\n    pass\n");
    }

    #[test]
    fn test_client_config() {
        assert_eq!(
            client_config(None),
            json!({"mcpServers": {"mcp-python-helper": {"command": "mcp-python-helper", "args": []}}})
        );

        let dev = client_config(Some(Path::new("/src/helper")));
        let entry = &dev["mcpServers"]["mcp-python-helper"];
        assert_eq!(entry["command"], "cargo");
        assert_eq!(entry["args"][3], "/src/helper/Cargo.toml");
        assert_eq!(entry["args"][5], "mcp-python-helper");
    }
}
