//! # mcp-python-helper
//!
//! A Model Context Protocol server with tools to help with Python projects.
//!
//! ## Tools
//!
//! - **edit-python-code**: insert code before or after a target (function,
//!   class, method, assignment or a literal statement), or replace it.
//!   Only the edited lines change; formatting elsewhere is untouched.
//! - **locate-python-symbol**: find where a symbol is defined in a project,
//!   using a built-in tree-sitter index or pyright over LSP.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mcp_python_helper::edit::{modify_source, EditPosition, EditRequest};
//!
//! let source = "def greet():\n    return 'hi'\n";
//! let edited = modify_source(
//!     source,
//!     &EditRequest {
//!         code: "GREETING = 'hi'".to_string(),
//!         target: "greet".to_string(),
//!         position: EditPosition::Before,
//!     },
//! )
//! .unwrap();
//! assert!(edited.starts_with("GREETING = 'hi'\n"));
//! ```

pub mod cli;
pub mod config;
pub mod edit;
pub mod error;
pub mod index;
pub mod locate;
pub mod lsp;
pub mod mcp;
pub mod parser;

// Re-exports for convenience
pub use config::{HelperConfig, LocateBackend};
pub use edit::{edit_file, modify_source, EditOutcome, EditPosition, EditRequest};
pub use error::{HelperError, Result};
pub use index::{build_index, SymbolIndex, SymbolKind, SymbolLocation};
pub use locate::{format_locations, locate_symbol, IndexLocator, PyrightLocator, SymbolLocator};
pub use mcp::McpServer;
