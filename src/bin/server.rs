//! mcp-python-helper: MCP server with tools for Python projects.
//!
//! Usage:
//!   mcp-python-helper                       # MCP server on stdio
//!   mcp-python-helper locate MyClass -r .   # one-off symbol lookup
//!   mcp-python-helper edit app.py -t main -p after --code "..."
//!   mcp-python-helper client-config [--dev DIR]

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mcp_python_helper::cli::{client_config, Cli, Commands};
use mcp_python_helper::config::HelperConfig;
use mcp_python_helper::edit::edit_file;
use mcp_python_helper::locate::{self, locate_symbol};
use mcp_python_helper::mcp::{McpServer, ToolContext};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = HelperConfig::resolve_path(cli.config.as_deref());
    // An explicitly named config must load; the default file is optional.
    let explicit = match cli.config {
        Some(_) => Some(
            HelperConfig::try_load(&config_path)
                .with_context(|| format!("failed to load config {}", config_path.display()))?,
        ),
        None => None,
    };
    let log_filter = match &explicit {
        Some(config) => config.server.log_filter.clone(),
        None => HelperConfig::peek_log_filter(&config_path),
    };

    // Tracing goes to stderr; stdout carries the MCP protocol.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config = match explicit {
        Some(config) => config,
        None => HelperConfig::load(&config_path),
    };

    match cli.command {
        None | Some(Commands::Serve) => {
            let locator = locate::from_config(&config);
            info!(backend = locator.name(), "MCP server ready, waiting for requests on stdin");
            let server = McpServer::new(config.server.name.clone(), ToolContext::new(locator));
            server.run_stdio().await?;
        }

        Some(Commands::Locate { symbol, root }) => {
            let locator = locate::from_config(&config);
            let result = locate_symbol(locator.as_ref(), &root, &symbol).await;
            if let Err(e) = locator.shutdown().await {
                warn!(error = %e, "locator shutdown failed");
            }
            println!("{}", result?);
        }

        Some(Commands::Edit(args)) => {
            let request = args.to_request()?;
            let outcome = edit_file(&args.file, &request)?;
            println!(
                "Successfully modified {} - {} {} ({} -> {} lines)",
                args.file.display(),
                request.position,
                request.target,
                outcome.lines_before,
                outcome.lines_after
            );
        }

        Some(Commands::ClientConfig { dev }) => {
            let dev = match dev {
                Some(dir) => Some(
                    dir.canonicalize()
                        .with_context(|| format!("no such directory {}", dir.display()))?,
                ),
                None => None,
            };
            println!("{}", serde_json::to_string_pretty(&client_config(dev.as_deref()))?);
        }
    }

    Ok(())
}
