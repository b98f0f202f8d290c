//! Error types for mcp-python-helper.

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, HelperError>;

#[derive(Debug, Error)]
pub enum HelperError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The Python source being edited or indexed does not parse.
    #[error("Failed to parse Python source: {0}")]
    Parse(String),

    /// Code supplied for insertion, or the edited result, is not valid Python.
    #[error("Invalid Python code: {0}")]
    InvalidCode(String),

    #[error("Target not found: '{0}'")]
    TargetNotFound(String),

    #[error("{count} targets found for '{target}'")]
    MultipleTargets { target: String, count: usize },

    #[error("Unsupported edit: {0}")]
    UnsupportedEdit(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Language server error: {0}")]
    Lsp(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),
}
