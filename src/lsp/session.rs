//! An initialized language server bound to one workspace root.

use lsp_types::{OneOf, SymbolInformation, Url, WorkspaceSymbol, WorkspaceSymbolResponse};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::client::{LspClient, LspClientOptions};
use crate::config::PyrightConfig;
use crate::error::{HelperError, Result};
use crate::index::{SymbolKind, SymbolLocation};

/// Document opened at startup so the server begins analysing the workspace.
pub const VIRTUAL_DOCUMENT: &str = "__virtual_init__.py";

pub struct LspSession {
    client: LspClient,
    root: PathBuf,
}

impl LspSession {
    /// Spawn the configured server for `workspace_root` and initialize it.
    pub async fn start(workspace_root: &Path, config: &PyrightConfig) -> Result<Self> {
        let root = workspace_root.canonicalize()?;
        let options = LspClientOptions {
            settings: config.settings.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        };
        let client = LspClient::spawn(&config.command, &root, options)?;
        Self::initialize(
            client,
            root,
            &config.settings,
            Duration::from_secs(config.startup_timeout_secs),
        )
        .await
    }

    /// Run the startup handshake on a connected client.
    pub async fn initialize(
        client: LspClient,
        root: PathBuf,
        settings: &Value,
        startup_timeout: Duration,
    ) -> Result<Self> {
        let root_uri = Url::from_directory_path(&root).map_err(|_| {
            HelperError::Lsp(format!("workspace root is not absolute: {}", root.display()))
        })?;
        let folder_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());

        let params = json!({
            "processId": std::process::id(),
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "rootUri": root_uri.as_str(),
            "workspaceFolders": [{"uri": root_uri.as_str(), "name": folder_name}],
            "capabilities": {
                "workspace": {
                    "configuration": true,
                    "didChangeConfiguration": {"dynamicRegistration": true},
                    "workspaceFolders": true,
                    "symbol": {"dynamicRegistration": false},
                },
                "textDocument": {
                    "synchronization": {"didSave": false},
                    "publishDiagnostics": {"relatedInformation": false},
                },
                "window": {"workDoneProgress": true},
            },
        });

        let result = client.request("initialize", params).await?;
        let server = result
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("language server");
        debug!(server, "initialize acknowledged");

        client.notify("initialized", json!({})).await?;
        client
            .notify(
                "workspace/didChangeConfiguration",
                json!({"settings": settings}),
            )
            .await?;

        let virtual_uri = Url::from_file_path(root.join(VIRTUAL_DOCUMENT)).map_err(|_| {
            HelperError::Lsp(format!("cannot build document uri under {}", root.display()))
        })?;
        client
            .notify(
                "textDocument/didOpen",
                json!({
                    "textDocument": {
                        "uri": virtual_uri.as_str(),
                        "languageId": "python",
                        "version": 1,
                        "text": "# Virtual file to trigger analysis\n",
                    }
                }),
            )
            .await?;

        client.wait_for_diagnostics(startup_timeout).await?;
        info!(root = %root.display(), "language server ready");

        Ok(Self { client, root })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.root
    }

    /// `workspace/symbol` for `query`.
    pub async fn find_symbol(&self, query: &str) -> Result<Vec<SymbolLocation>> {
        let result = self
            .client
            .request("workspace/symbol", json!({"query": query}))
            .await?;
        let locations = symbols_from_response(result)?;
        debug!(query, count = locations.len(), "workspace/symbol answered");
        Ok(locations)
    }

    pub async fn shutdown(self) -> Result<()> {
        self.client.shutdown().await
    }
}

/// Convert a `workspace/symbol` result. Symbols outside the file system
/// (non `file:` URIs) are dropped.
pub fn symbols_from_response(result: Value) -> Result<Vec<SymbolLocation>> {
    if result.is_null() {
        return Ok(Vec::new());
    }
    let response: WorkspaceSymbolResponse = serde_json::from_value(result)?;
    Ok(match response {
        WorkspaceSymbolResponse::Flat(symbols) => {
            symbols.into_iter().filter_map(from_information).collect()
        }
        WorkspaceSymbolResponse::Nested(symbols) => {
            symbols.into_iter().filter_map(from_workspace_symbol).collect()
        }
    })
}

fn from_information(symbol: SymbolInformation) -> Option<SymbolLocation> {
    let path = symbol.location.uri.to_file_path().ok()?;
    let start = symbol.location.range.start;
    Some(SymbolLocation {
        name: symbol.name,
        kind: kind_from_lsp(symbol.kind),
        path,
        line: start.line as usize + 1,
        column: start.character as usize + 1,
        container: symbol.container_name.filter(|c| !c.is_empty()),
    })
}

fn from_workspace_symbol(symbol: WorkspaceSymbol) -> Option<SymbolLocation> {
    let (uri, line, character) = match symbol.location {
        OneOf::Left(location) => (
            location.uri,
            location.range.start.line,
            location.range.start.character,
        ),
        OneOf::Right(location) => (location.uri, 0, 0),
    };
    Some(SymbolLocation {
        name: symbol.name,
        kind: kind_from_lsp(symbol.kind),
        path: uri.to_file_path().ok()?,
        line: line as usize + 1,
        column: character as usize + 1,
        container: symbol.container_name.filter(|c| !c.is_empty()),
    })
}

fn kind_from_lsp(kind: lsp_types::SymbolKind) -> SymbolKind {
    use lsp_types::SymbolKind as Lsp;

    match kind {
        Lsp::CLASS | Lsp::INTERFACE | Lsp::STRUCT | Lsp::ENUM => SymbolKind::Class,
        Lsp::METHOD | Lsp::CONSTRUCTOR => SymbolKind::Method,
        Lsp::FUNCTION => SymbolKind::Function,
        Lsp::VARIABLE => SymbolKind::Variable,
        Lsp::CONSTANT => SymbolKind::Constant,
        Lsp::MODULE | Lsp::NAMESPACE | Lsp::PACKAGE | Lsp::FILE => SymbolKind::Module,
        Lsp::PROPERTY => SymbolKind::Property,
        Lsp::FIELD | Lsp::ENUM_MEMBER => SymbolKind::Field,
        _ => SymbolKind::Other,
    }
}
