//! Python parsing on top of tree-sitter.
//!
//! Provides the parse entry point, syntax-error detection, a statement
//! walker that tracks enclosing class/function scopes, and symbol
//! extraction used by the workspace index.

pub mod language;
pub mod symbols;
pub mod walk;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{HelperError, Result};

pub use language::{is_python_file, python};
pub use symbols::extract_symbols;
pub use walk::{declared_name, definition_of, is_definition, walk_statements, Scope, ScopeKind};

/// Parse Python source into a syntax tree.
///
/// tree-sitter is error tolerant, so a tree is returned even for broken
/// input; use [`first_syntax_error`] to check validity.
pub fn parse(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&python())
        .map_err(|e| HelperError::Parse(format!("failed to load grammar: {}", e)))?;
    parser
        .parse(source, None)
        .ok_or_else(|| HelperError::Parse("parser produced no tree".to_string()))
}

/// Location (1-indexed line, column) of the first ERROR or MISSING node.
pub fn first_syntax_error(tree: &Tree) -> Option<(usize, usize)> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }
    find_error(root).map(|node| {
        let pos = node.start_position();
        (pos.row + 1, pos.column + 1)
    })
}

fn find_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(find_error)
}

/// Parse and reject sources containing syntax errors.
pub fn parse_valid(source: &str) -> Result<Tree> {
    let tree = parse(source)?;
    if let Some((line, column)) = first_syntax_error(&tree) {
        return Err(HelperError::Parse(format!(
            "syntax error at line {}, column {}",
            line, column
        )));
    }
    Ok(tree)
}
