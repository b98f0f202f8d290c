//! Python file detection and tree-sitter grammar loading.

use std::path::Path;
use tree_sitter::Language;

/// Extensions treated as Python sources (modules, stubs, windowed scripts).
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi", "pyw"];

/// Detect a Python source from its file extension.
pub fn is_python_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PYTHON_EXTENSIONS.contains(&ext))
}

/// The tree-sitter grammar for Python.
pub fn python() -> Language {
    tree_sitter_python::LANGUAGE.into()
}
