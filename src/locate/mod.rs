//! Symbol lookup behind the `locate-python-symbol` tool.
//!
//! Two backends implement [`SymbolLocator`]: the built-in tree-sitter
//! index, and pyright driven over LSP. Both report
//! [`SymbolLocation`]s, rendered by [`format_locations`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{HelperConfig, LocateBackend, LocateConfig, PyrightConfig};
use crate::error::{HelperError, Result};
use crate::index::{build_index, SymbolLocation};
use crate::lsp::LspSession;

#[async_trait]
pub trait SymbolLocator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Definitions of `symbol` under `workspace_root`.
    async fn locate(&self, workspace_root: &Path, symbol: &str) -> Result<Vec<SymbolLocation>>;

    /// Release any external resources.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the locator selected by `[locate] backend`.
pub fn from_config(config: &HelperConfig) -> Arc<dyn SymbolLocator> {
    match config.locate.backend {
        LocateBackend::Index => Arc::new(IndexLocator::new(config.locate.clone())),
        LocateBackend::Pyright => Arc::new(PyrightLocator::new(
            config.pyright.clone(),
            config.locate.max_results,
        )),
    }
}

/// Look `symbol` up and render the result text.
pub async fn locate_symbol(
    locator: &dyn SymbolLocator,
    workspace_root: &Path,
    symbol: &str,
) -> Result<String> {
    let root = workspace_root_dir(workspace_root)?;
    let locations = locator.locate(&root, symbol).await?;
    info!(
        symbol,
        backend = locator.name(),
        root = %root.display(),
        found = locations.len(),
        "symbol located"
    );
    Ok(format_locations(symbol, &locations, &root))
}

/// Human readable result, paths relative to `root` where possible.
pub fn format_locations(symbol: &str, locations: &[SymbolLocation], root: &Path) -> String {
    if locations.is_empty() {
        return format!("No definitions found for symbol '{}'", symbol);
    }

    locations
        .iter()
        .map(|loc| {
            let path = loc.path.strip_prefix(root).unwrap_or(&loc.path);
            format!(
                "Found {} ({}) in:\n  File: {}\n  Line {}, Column {}",
                loc.name,
                loc.kind,
                path.display(),
                loc.line,
                loc.column
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn workspace_root_dir(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(HelperError::InvalidArguments(format!(
            "workspace root is not a directory: {}",
            path.display()
        )));
    }
    Ok(path.canonicalize()?)
}

/// Scans the workspace with tree-sitter on every call, so results always
/// reflect the files on disk.
pub struct IndexLocator {
    config: LocateConfig,
}

impl IndexLocator {
    pub fn new(config: LocateConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SymbolLocator for IndexLocator {
    fn name(&self) -> &'static str {
        "index"
    }

    async fn locate(&self, workspace_root: &Path, symbol: &str) -> Result<Vec<SymbolLocation>> {
        let root = workspace_root.to_path_buf();
        let symbol = symbol.to_string();
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            let index = build_index(&root, &config);
            index
                .search(&symbol, config.max_results)
                .into_iter()
                .cloned()
                .collect()
        })
        .await
        .map_err(|e| HelperError::Io(std::io::Error::other(e)))
    }
}

/// Keeps one pyright session alive per workspace root.
pub struct PyrightLocator {
    config: PyrightConfig,
    max_results: usize,
    session: Mutex<Option<LspSession>>,
}

impl PyrightLocator {
    pub fn new(config: PyrightConfig, max_results: usize) -> Self {
        Self {
            config,
            max_results,
            session: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.session.lock().await.is_some()
    }
}

#[async_trait]
impl SymbolLocator for PyrightLocator {
    fn name(&self) -> &'static str {
        "pyright"
    }

    async fn locate(&self, workspace_root: &Path, symbol: &str) -> Result<Vec<SymbolLocation>> {
        let root = workspace_root.canonicalize()?;
        let mut guard = self.session.lock().await;

        if guard.as_ref().is_some_and(|s| s.workspace_root() != root) {
            if let Some(previous) = guard.take() {
                debug!(root = %previous.workspace_root().display(), "workspace changed");
                if let Err(e) = previous.shutdown().await {
                    warn!(error = %e, "failed to stop previous language server");
                }
            }
        }

        if guard.is_none() {
            *guard = Some(LspSession::start(&root, &self.config).await?);
        }
        let session = guard
            .as_ref()
            .ok_or_else(|| HelperError::Lsp("no language server session".to_string()))?;

        let mut locations = session.find_symbol(symbol).await?;
        locations.truncate(self.max_results);
        Ok(locations)
    }

    async fn shutdown(&self) -> Result<()> {
        match self.session.lock().await.take() {
            Some(session) => session.shutdown().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SymbolKind;
    use std::fs;

    fn location(name: &str, kind: SymbolKind, path: PathBuf, line: usize, column: usize) -> SymbolLocation {
        SymbolLocation {
            name: name.to_string(),
            kind,
            path,
            line,
            column,
            container: None,
        }
    }

    #[test]
    fn test_format_no_locations() {
        assert_eq!(
            format_locations("Missing", &[], Path::new("/ws")),
            "No definitions found for symbol 'Missing'"
        );
    }

    #[test]
    fn test_format_relative_paths_and_separators() {
        let root = Path::new("/ws");
        let locations = vec![
            location("MyClass", SymbolKind::Class, root.join("main.py"), 4, 7),
            location("MyClass", SymbolKind::Class, root.join("pkg/other.py"), 1, 7),
        ];
        assert_eq!(
            format_locations("MyClass", &locations, root),
            "Found MyClass (class) in:\n  File: main.py\n  Line 4, Column 7\n\n\
             Found MyClass (class) in:\n  File: pkg/other.py\n  Line 1, Column 7"
        );
    }

    #[test]
    fn test_format_keeps_paths_outside_root() {
        let locations = vec![location(
            "Path",
            SymbolKind::Class,
            PathBuf::from("/usr/lib/python3/pathlib.py"),
            10,
            7,
        )];
        let text = format_locations("Path", &locations, Path::new("/ws"));
        assert!(text.contains("File: /usr/lib/python3/pathlib.py"));
    }

    #[tokio::test]
    async fn test_index_locator_finds_definitions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "class Service:\n    def start(self):\n        pass\n",
        )
        .unwrap();

        let locator = IndexLocator::new(LocateConfig::default());
        let text = locate_symbol(&locator, dir.path(), "start").await.unwrap();
        assert_eq!(
            text,
            "Found start (method) in:\n  File: app.py\n  Line 2, Column 9"
        );
    }

    #[tokio::test]
    async fn test_locate_rejects_missing_root() {
        let locator = IndexLocator::new(LocateConfig::default());
        let err = locate_symbol(&locator, Path::new("/definitely/not/here"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, HelperError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_pyright_locator_reports_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = PyrightConfig {
            command: vec!["mcp-python-helper-no-such-server".to_string()],
            ..PyrightConfig::default()
        };
        let locator = PyrightLocator::new(config, 10);

        let err = locator.locate(dir.path(), "x").await.unwrap_err();
        assert!(matches!(err, HelperError::Lsp(_)));
        assert!(!locator.is_running().await);
        locator.shutdown().await.unwrap();
    }

    #[test]
    fn test_from_config_selects_backend() {
        let mut config = HelperConfig::default();
        assert_eq!(from_config(&config).name(), "index");
        config.locate.backend = LocateBackend::Pyright;
        assert_eq!(from_config(&config).name(), "pyright");
    }
}
