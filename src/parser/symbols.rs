//! Symbol extraction from Python sources.
//!
//! Collects classes, functions, methods and module/class level
//! assignments. Locals inside function bodies are not symbols.

use std::path::Path;
use tree_sitter::Node;

use super::walk::{declared_name, definition_of, walk_statements, Scope, ScopeKind};
use crate::error::Result;
use crate::index::types::{is_constant_name, SymbolKind, SymbolLocation};

/// Extract every definition in `source`. `path` is recorded verbatim.
pub fn extract_symbols(path: &Path, source: &str) -> Result<Vec<SymbolLocation>> {
    let tree = super::parse(source)?;
    let bytes = source.as_bytes();
    let mut symbols = Vec::new();

    walk_statements(tree.root_node(), bytes, &mut |stmt, scopes| {
        if let Some(symbol) = symbol_for(stmt, scopes, path, bytes) {
            symbols.push(symbol);
        }
    });

    Ok(symbols)
}

fn symbol_for(stmt: Node, scopes: &[Scope], path: &Path, source: &[u8]) -> Option<SymbolLocation> {
    let name = declared_name(stmt, source)?;
    let def = definition_of(stmt);
    let innermost = scopes.last().map(|s| s.kind);

    let (kind, name_node) = match def.kind() {
        "class_definition" => (SymbolKind::Class, def.child_by_field_name("name")?),
        "function_definition" => {
            let kind = if innermost == Some(ScopeKind::Class) {
                if has_property_decorator(stmt, source) {
                    SymbolKind::Property
                } else {
                    SymbolKind::Method
                }
            } else {
                SymbolKind::Function
            };
            (kind, def.child_by_field_name("name")?)
        }
        _ => {
            if innermost == Some(ScopeKind::Function) {
                return None;
            }
            let kind = if is_constant_name(name) {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            };
            let left = def.named_child(0)?.child_by_field_name("left")?;
            (kind, left)
        }
    };

    let pos = name_node.start_position();
    let container = if scopes.is_empty() {
        None
    } else {
        Some(
            scopes
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join("."),
        )
    };

    Some(SymbolLocation {
        name: name.to_string(),
        kind,
        path: path.to_path_buf(),
        line: pos.row + 1,
        column: pos.column + 1,
        container,
    })
}

fn has_property_decorator(stmt: Node, source: &[u8]) -> bool {
    if stmt.kind() != "decorated_definition" {
        return false;
    }
    let mut cursor = stmt.walk();
    let decorators: Vec<Node> = stmt
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "decorator")
        .collect();
    decorators.iter().any(|d| {
        d.utf8_text(source).is_ok_and(|text| {
            let text = text.trim_start_matches('@').trim();
            text == "property" || text.ends_with(".setter") || text.ends_with(".getter")
        })
    })
}
