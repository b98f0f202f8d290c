//! Target resolution for structural edits.
//!
//! A target is either a dotted identifier path (`my_function`,
//! `MyClass.my_method`, `MY_CONSTANT`) matched against declared names, or
//! literal statement text (`var = 3`) matched with whitespace collapsed.
//! Identifier-looking targets are tried both ways.

use std::collections::HashSet;
use tree_sitter::{Node, Tree};

use super::indent::collapse_whitespace;
use crate::error::{HelperError, Result};
use crate::parser::{declared_name, is_definition, walk_statements, Scope, ScopeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    text: String,
    path: Option<Vec<String>>,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(HelperError::InvalidArguments(
                "target must not be empty".to_string(),
            ));
        }

        let segments: Vec<String> = text.split('.').map(String::from).collect();
        let path = if segments.iter().all(|s| is_identifier(s)) {
            Some(segments)
        } else {
            None
        };

        Ok(Self {
            text: text.to_string(),
            path,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> Option<&[String]> {
        self.path.as_deref()
    }

    /// Whether a statement declaring `name` inside `scopes` is this target.
    ///
    /// Leading path segments must equal the innermost enclosing scopes.
    /// Assignments only count at module or class level.
    fn matches_name(&self, name: &str, scopes: &[Scope], is_def: bool) -> bool {
        let Some((last, leading)) = self.path().and_then(|p| p.split_last()) else {
            return false;
        };
        if last != name {
            return false;
        }
        if !is_def && scopes.last().is_some_and(|s| s.kind == ScopeKind::Function) {
            return false;
        }
        if leading.len() > scopes.len() {
            return false;
        }
        scopes[scopes.len() - leading.len()..]
            .iter()
            .zip(leading)
            .all(|(scope, segment)| &scope.name == segment)
    }
}

/// Find every statement matching `target`, in source order, without
/// duplicates.
pub fn find_targets<'t>(tree: &'t Tree, source: &str, target: &Target) -> Vec<Node<'t>> {
    let bytes = source.as_bytes();
    let wanted_text = collapse_whitespace(target.text());
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    walk_statements(tree.root_node(), bytes, &mut |stmt, scopes| {
        let by_name = declared_name(stmt, bytes)
            .is_some_and(|name| target.matches_name(name, scopes, is_definition(stmt)));
        let by_text = !by_name
            && stmt
                .utf8_text(bytes)
                .is_ok_and(|text| collapse_whitespace(text) == wanted_text);

        if (by_name || by_text) && seen.insert(stmt.id()) {
            found.push(stmt);
        }
    });

    found
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const SOURCE: &str = r#"
MAX_RETRIES = 3
var = 3

class Queue:
    size = 0

    def enqueue(self, item):
        size = 1
        self.items.append(item)

    def dequeue(self):
        return self.items.pop(0)

class Stack:
    def enqueue(self, item):
        pass

def enqueue(item):
    return item
"#;

    fn lines_of(target: &str) -> Vec<usize> {
        let tree = parse(SOURCE).unwrap();
        let target = Target::parse(target).unwrap();
        find_targets(&tree, SOURCE, &target)
            .iter()
            .map(|n| n.start_position().row + 1)
            .collect()
    }

    #[test]
    fn test_parse_target() {
        let t = Target::parse("  MyClass.my_method ").unwrap();
        assert_eq!(t.text(), "MyClass.my_method");
        assert_eq!(t.path().unwrap(), ["MyClass", "my_method"]);

        let t = Target::parse("var = 3").unwrap();
        assert!(t.path().is_none());

        assert!(Target::parse("1abc").unwrap().path().is_none());
        assert!(Target::parse("a..b").unwrap().path().is_none());
        assert!(Target::parse("   ").is_err());
    }

    #[test]
    fn test_single_name_matches_every_depth() {
        assert_eq!(lines_of("enqueue"), vec![8, 16, 19]);
    }

    #[test]
    fn test_dotted_path_narrows_to_class() {
        assert_eq!(lines_of("Queue.enqueue"), vec![8]);
        assert_eq!(lines_of("Stack.enqueue"), vec![16]);
        assert!(lines_of("Missing.enqueue").is_empty());
    }

    #[test]
    fn test_assignments_only_outside_functions() {
        assert_eq!(lines_of("MAX_RETRIES"), vec![2]);
        assert_eq!(lines_of("size"), vec![6]);
        assert_eq!(lines_of("Queue.size"), vec![6]);
    }

    #[test]
    fn test_statement_text_match() {
        assert_eq!(lines_of("var=3"), Vec::<usize>::new());
        assert_eq!(lines_of("var   =  3"), vec![3]);
        assert_eq!(lines_of("self.items.append(item)"), vec![10]);
        assert_eq!(lines_of("return item"), vec![20]);
    }
}
