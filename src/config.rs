//! Configuration loaded from `mcp-python-helper.toml`.
//!
//! Every field has a default, so a missing or empty file is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{HelperError, Result};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "mcp-python-helper.toml";

/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "MCP_PYTHON_HELPER_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    pub server: ServerConfig,
    pub locate: LocateConfig,
    pub pyright: PyrightConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name advertised in `serverInfo`.
    pub name: String,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "mcp-python-helper".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

/// Which engine answers `locate-python-symbol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocateBackend {
    /// Built-in tree-sitter index, no external tools needed.
    #[default]
    Index,
    /// `pyright-langserver` driven over LSP.
    Pyright,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateConfig {
    pub backend: LocateBackend,
    pub max_results: usize,
    /// Directory names never descended into while indexing.
    pub exclude_dirs: Vec<String>,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            backend: LocateBackend::Index,
            max_results: 50,
            exclude_dirs: [
                "__pycache__",
                "venv",
                "node_modules",
                "site-packages",
                "build",
                "dist",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PyrightConfig {
    /// Program and arguments of the language server.
    pub command: Vec<String>,
    pub startup_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Settings returned for `workspace/configuration` and pushed with
    /// `workspace/didChangeConfiguration`.
    pub settings: Value,
}

impl Default for PyrightConfig {
    fn default() -> Self {
        Self {
            command: vec!["pyright-langserver".to_string(), "--stdio".to_string()],
            startup_timeout_secs: 30,
            request_timeout_secs: 30,
            settings: json!({
                "python": {
                    "analysis": {
                        "autoSearchPaths": true,
                        "diagnosticMode": "workspace",
                        "typeCheckingMode": "basic",
                        "useLibraryCodeForTypes": true
                    }
                }
            }),
        }
    }
}

impl HelperConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: HelperConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, failing on IO or parse errors.
    pub fn try_load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load a configuration file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Log filter named by the file at `path`, or the default one. Read
    /// before logging is set up, so problems with the file are ignored here
    /// and reported by [`HelperConfig::load`].
    pub fn peek_log_filter(path: &Path) -> String {
        Self::try_load(path)
            .map(|config| config.server.log_filter)
            .unwrap_or_else(|_| ServerConfig::default().log_filter)
    }

    /// Resolve the config path: explicit flag, then env var, then the
    /// default file in the working directory.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    fn validate(&self) -> Result<()> {
        if self.pyright.command.is_empty() {
            return Err(HelperError::Config(
                "pyright.command must name a program".to_string(),
            ));
        }
        if self.locate.max_results == 0 {
            return Err(HelperError::Config(
                "locate.max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = HelperConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.name, "mcp-python-helper");
        assert_eq!(config.locate.backend, LocateBackend::Index);
        assert_eq!(config.locate.max_results, 50);
        assert_eq!(config.pyright.command[0], "pyright-langserver");
        assert_eq!(
            config.pyright.settings["python"]["analysis"]["typeCheckingMode"],
            "basic"
        );
    }

    #[test]
    fn test_partial_config() {
        let text = r#"
[locate]
backend = "pyright"

[pyright]
command = ["/opt/bin/pyright-langserver", "--stdio"]
request_timeout_secs = 5

[pyright.settings.python.analysis]
typeCheckingMode = "strict"
"#;
        let config = HelperConfig::from_toml_str(text).unwrap();
        assert_eq!(config.locate.backend, LocateBackend::Pyright);
        assert_eq!(config.locate.max_results, 50);
        assert_eq!(config.pyright.request_timeout_secs, 5);
        assert_eq!(config.pyright.startup_timeout_secs, 30);
        assert_eq!(
            config.pyright.settings["python"]["analysis"]["typeCheckingMode"],
            "strict"
        );
    }

    #[test]
    fn test_rejects_empty_command() {
        let result = HelperConfig::from_toml_str("[pyright]\ncommand = []\n");
        assert!(matches!(result, Err(HelperError::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let result = HelperConfig::from_toml_str("[locate]\nbackend = \"jedi\"\n");
        assert!(matches!(result, Err(HelperError::Toml(_))));
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = HelperConfig::load(&dir.path().join("absent.toml"));
        assert_eq!(config.locate.backend, LocateBackend::Index);
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[locate\nbackend = ").unwrap();
        let config = HelperConfig::load(&path);
        assert_eq!(config.server.log_filter, "info");
        assert!(HelperConfig::try_load(&path).is_err());
    }

    #[test]
    fn test_peek_log_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        assert_eq!(HelperConfig::peek_log_filter(&path), "info");

        std::fs::write(&path, "[server]\nlog_filter = \"mcp_python_helper=debug\"\n").unwrap();
        assert_eq!(HelperConfig::peek_log_filter(&path), "mcp_python_helper=debug");

        std::fs::write(&path, "[server\nlog_filter = ").unwrap();
        assert_eq!(HelperConfig::peek_log_filter(&path), "info");
    }

    #[test]
    fn test_resolve_explicit_path() {
        let path = HelperConfig::resolve_path(Some(Path::new("/etc/helper.toml")));
        assert_eq!(path, PathBuf::from("/etc/helper.toml"));
    }
}
