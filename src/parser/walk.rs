//! Statement traversal with scope tracking.
//!
//! Statements are the named children of `module` and of every nested
//! `block`. Comments are extras and never visited. Decorated definitions
//! are visited once, as the `decorated_definition` node.

use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Class,
    Function,
}

/// An enclosing class or function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub name: String,
    pub kind: ScopeKind,
}

/// Visit every statement below `root`, passing the enclosing scope chain
/// (outermost first).
pub fn walk_statements<'t, F>(root: Node<'t>, source: &[u8], visit: &mut F)
where
    F: FnMut(Node<'t>, &[Scope]),
{
    let mut scopes = Vec::new();
    visit_block(root, source, &mut scopes, visit);
}

fn visit_block<'t, F>(container: Node<'t>, source: &[u8], scopes: &mut Vec<Scope>, visit: &mut F)
where
    F: FnMut(Node<'t>, &[Scope]),
{
    let mut cursor = container.walk();
    let statements: Vec<Node<'t>> = container
        .named_children(&mut cursor)
        .filter(|n| !n.is_extra())
        .collect();

    for stmt in statements {
        visit(stmt, scopes);
        descend(stmt, source, scopes, visit);
    }
}

fn descend<'t, F>(stmt: Node<'t>, source: &[u8], scopes: &mut Vec<Scope>, visit: &mut F)
where
    F: FnMut(Node<'t>, &[Scope]),
{
    let def = definition_of(stmt);
    let kind = match def.kind() {
        "class_definition" => ScopeKind::Class,
        "function_definition" => ScopeKind::Function,
        _ => {
            visit_nested_blocks(stmt, source, scopes, visit);
            return;
        }
    };

    let name = def
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(source).ok());
    if let (Some(name), Some(body)) = (name, def.child_by_field_name("body")) {
        scopes.push(Scope {
            name: name.to_string(),
            kind,
        });
        visit_block(body, source, scopes, visit);
        scopes.pop();
    }
}

/// Compound statements (if/for/while/try/with/match) keep their blocks
/// inside clause nodes; find them without treating clauses as statements.
fn visit_nested_blocks<'t, F>(node: Node<'t>, source: &[u8], scopes: &mut Vec<Scope>, visit: &mut F)
where
    F: FnMut(Node<'t>, &[Scope]),
{
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    for child in children {
        if child.kind() == "block" {
            visit_block(child, source, scopes, visit);
        } else {
            visit_nested_blocks(child, source, scopes, visit);
        }
    }
}

/// The class/function node behind a statement, unwrapping decorators.
pub fn definition_of(stmt: Node) -> Node {
    if stmt.kind() == "decorated_definition" {
        stmt.child_by_field_name("definition").unwrap_or(stmt)
    } else {
        stmt
    }
}

/// Name a statement introduces: a class or function name, or the single
/// identifier assigned to (`X = ...`, `X: int = ...`).
pub fn declared_name<'s>(stmt: Node, source: &'s [u8]) -> Option<&'s str> {
    let def = definition_of(stmt);
    match def.kind() {
        "class_definition" | "function_definition" => def
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok()),
        "expression_statement" => {
            let expr = def.named_child(0)?;
            if expr.kind() != "assignment" {
                return None;
            }
            let left = expr.child_by_field_name("left")?;
            if left.kind() != "identifier" {
                return None;
            }
            left.utf8_text(source).ok()
        }
        _ => None,
    }
}

/// True for statements that are a class or function definition.
pub fn is_definition(stmt: Node) -> bool {
    matches!(
        definition_of(stmt).kind(),
        "class_definition" | "function_definition"
    )
}
