//! Core types for symbol lookup.
//!
//! Both the built-in index and the pyright backend report results as
//! [`SymbolLocation`]s so the locate tool formats them the same way.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The kind of a located symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Class,
    Function,
    /// A function defined directly in a class body.
    Method,
    Variable,
    /// A module or class level assignment to an UPPER_CASE name.
    Constant,
    Module,
    Property,
    Field,
    Other,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Class => write!(f, "class"),
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Method => write!(f, "method"),
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Constant => write!(f, "constant"),
            SymbolKind::Module => write!(f, "module"),
            SymbolKind::Property => write!(f, "property"),
            SymbolKind::Field => write!(f, "field"),
            SymbolKind::Other => write!(f, "other"),
        }
    }
}

/// Where a symbol is defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolLocation {
    pub name: String,
    pub kind: SymbolKind,
    /// Absolute path of the defining file.
    pub path: PathBuf,
    /// 1-indexed line of the symbol name.
    pub line: usize,
    /// 1-indexed column of the symbol name.
    pub column: usize,
    /// Dotted chain of enclosing classes/functions, if any.
    pub container: Option<String>,
}

impl SymbolLocation {
    /// `Container.name`, or just `name` at module level.
    pub fn qualified_name(&self) -> String {
        match &self.container {
            Some(container) => format!("{}.{}", container, self.name),
            None => self.name.clone(),
        }
    }
}

/// Heuristic used for module/class level assignments: `MAX_RETRIES`,
/// `API_V2`, but not `_` or `counter`.
pub fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_alphabetic())
        && name
            .chars()
            .all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '_')
}
