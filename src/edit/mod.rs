//! Structural edits of Python sources.
//!
//! An edit inserts code before or after a target statement, or replaces
//! it. The target is resolved on the tree-sitter syntax tree; the change
//! itself is a text splice, so everything outside the edited lines keeps
//! its original formatting and comments.

pub mod indent;
pub mod target;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use tree_sitter::Node;

use crate::error::{HelperError, Result};
use crate::parser::{first_syntax_error, parse, parse_valid};

pub use target::{find_targets, Target};

/// Where new code goes relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditPosition {
    Before,
    After,
    Replace,
}

impl fmt::Display for EditPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditPosition::Before => write!(f, "before"),
            EditPosition::After => write!(f, "after"),
            EditPosition::Replace => write!(f, "replace"),
        }
    }
}

impl FromStr for EditPosition {
    type Err = HelperError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "before" => Ok(EditPosition::Before),
            "after" => Ok(EditPosition::After),
            "replace" => Ok(EditPosition::Replace),
            other => Err(HelperError::InvalidArguments(format!(
                "position must be one of before, after, replace (got '{}')",
                other
            ))),
        }
    }
}

/// A single edit against one source.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub code: String,
    pub target: String,
    pub position: EditPosition,
}

/// Summary of a file edit.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub path: PathBuf,
    pub lines_before: usize,
    pub lines_after: usize,
}

/// Byte range of the whole lines a target statement occupies.
struct StatementSpan {
    line_start: usize,
    line_end: usize,
    indent: String,
}

/// Apply `request` to `source` and return the new source.
pub fn modify_source(source: &str, request: &EditRequest) -> Result<String> {
    let tree = parse_valid(source)?;

    let code = indent::dedent(&request.code)?;
    if code.is_empty() {
        return Err(HelperError::InvalidCode("no code to insert".to_string()));
    }
    let code_tree = parse(&code)?;
    if let Some((line, column)) = first_syntax_error(&code_tree) {
        return Err(HelperError::InvalidCode(format!(
            "syntax error in new code at line {}, column {}",
            line, column
        )));
    }

    let target = Target::parse(&request.target)?;
    let matches = find_targets(&tree, source, &target);
    let node = match matches.as_slice() {
        [] => return Err(HelperError::TargetNotFound(target.text().to_string())),
        [node] => *node,
        many => {
            return Err(HelperError::MultipleTargets {
                target: target.text().to_string(),
                count: many.len(),
            })
        }
    };

    debug!(
        target = target.text(),
        kind = node.kind(),
        line = node.start_position().row + 1,
        position = %request.position,
        "target resolved"
    );

    let span = statement_span(source, node)?;
    let literal = indent::literal_rows(&code_tree);
    let rendered = indent::indent_lines(&code, &span.indent, &literal);

    let mut out = String::with_capacity(source.len() + rendered.len() + 1);
    match request.position {
        EditPosition::Before => {
            out.push_str(&source[..span.line_start]);
            out.push_str(&rendered);
            out.push_str(&source[span.line_start..]);
        }
        EditPosition::After => {
            out.push_str(&source[..span.line_end]);
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&rendered);
            out.push_str(&source[span.line_end..]);
        }
        EditPosition::Replace => {
            out.push_str(&source[..span.line_start]);
            out.push_str(&rendered);
            out.push_str(&source[span.line_end..]);
        }
    }

    if let Some((line, column)) = first_syntax_error(&parse(&out)?) {
        return Err(HelperError::InvalidCode(format!(
            "edit would leave a syntax error at line {}, column {}",
            line, column
        )));
    }

    Ok(out)
}

/// Read `path`, apply the edit and write the result back.
///
/// The file is left untouched when the edit fails.
pub fn edit_file(path: &Path, request: &EditRequest) -> Result<EditOutcome> {
    let source = fs::read_to_string(path)?;
    let modified = modify_source(&source, request)?;
    fs::write(path, &modified)?;

    let outcome = EditOutcome {
        path: path.to_path_buf(),
        lines_before: source.lines().count(),
        lines_after: modified.lines().count(),
    };
    info!(
        path = %path.display(),
        target = %request.target,
        position = %request.position,
        lines_before = outcome.lines_before,
        lines_after = outcome.lines_after,
        "file modified"
    );
    Ok(outcome)
}

fn statement_span(source: &str, node: Node) -> Result<StatementSpan> {
    let start = node.start_byte();
    let end = node.end_byte();

    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &source[line_start..start];
    if !prefix.chars().all(|c| c == ' ' || c == '\t') {
        return Err(HelperError::UnsupportedEdit(
            "target shares its first line with other code".to_string(),
        ));
    }

    let line_end = source[end..].find('\n').map_or(source.len(), |i| end + i + 1);
    let trailing = source[end..line_end].trim();
    if !trailing.is_empty() && !trailing.starts_with('#') {
        return Err(HelperError::UnsupportedEdit(
            "target shares its last line with other code".to_string(),
        ));
    }

    Ok(StatementSpan {
        line_start,
        line_end,
        indent: prefix.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"import os

# Retry budget
MAX_RETRIES = 3


class Queue:
    """FIFO queue."""

    def enqueue(self, item):
        self.items.append(item)  # keep order

    @property
    def size(self):
        return len(self.items)


def helper(x):
    return x * 2
"#;

    fn edit(code: &str, target: &str, position: EditPosition) -> Result<String> {
        modify_source(
            SOURCE,
            &EditRequest {
                code: code.to_string(),
                target: target.to_string(),
                position,
            },
        )
    }

    #[test]
    fn test_replace_function_preserves_rest() {
        let out = edit("def helper(x):\n    return x * 3\n", "helper", EditPosition::Replace).unwrap();
        assert!(out.contains("def helper(x):\n    return x * 3\n"));
        assert!(!out.contains("x * 2"));
        assert!(out.contains("# Retry budget"));
        assert!(out.contains("# keep order"));
        assert!(out.starts_with("import os\n"));
    }

    #[test]
    fn test_insert_method_after_method_is_reindented() {
        let code = "def dequeue(self):\n    return self.items.pop(0)";
        let out = edit(code, "Queue.enqueue", EditPosition::After).unwrap();
        assert!(out.contains(
            "        self.items.append(item)  # keep order\n    def dequeue(self):\n        return self.items.pop(0)\n"
        ));
    }

    #[test]
    fn test_insert_before_constant() {
        let out = edit("DEFAULT_TIMEOUT = 30.0", "MAX_RETRIES", EditPosition::Before).unwrap();
        assert!(out.contains("# Retry budget\nDEFAULT_TIMEOUT = 30.0\nMAX_RETRIES = 3\n"));
    }

    #[test]
    fn test_replace_statement_text() {
        let out = edit(
            "self.items.insert(0, item)",
            "self.items.append(item)",
            EditPosition::Replace,
        )
        .unwrap();
        assert!(out.contains("    def enqueue(self, item):\n        self.items.insert(0, item)\n"));
        assert!(!out.contains("# keep order"));
    }

    #[test]
    fn test_replace_decorated_definition_includes_decorator() {
        let code = "def size(self):\n    return 0\n";
        let out = edit(code, "Queue.size", EditPosition::Replace).unwrap();
        assert!(!out.contains("@property"));
        assert!(out.contains("    def size(self):\n        return 0\n"));
    }

    #[test]
    fn test_multiple_statements_are_all_inserted() {
        let out = edit("A = 1\nB = 2\n", "MAX_RETRIES", EditPosition::After).unwrap();
        assert!(out.contains("MAX_RETRIES = 3\nA = 1\nB = 2\n"));
    }

    #[test]
    fn test_indented_input_is_dedented() {
        let code = "\n        def extra():\n            pass\n";
        let out = edit(code, "helper", EditPosition::After).unwrap();
        assert!(out.ends_with("    return x * 2\ndef extra():\n    pass\n"));
    }

    #[test]
    fn test_string_literal_survives_reindent() {
        let code = "HELP = \"\"\"line one\nline two\n\"\"\"\n";
        let out = edit(code, "Queue.enqueue", EditPosition::After).unwrap();
        assert!(out.contains(
            "# keep order\n    HELP = \"\"\"line one\nline two\n\"\"\"\n"
        ));
    }

    #[test]
    fn test_indented_docstring_is_kept_verbatim() {
        let code = "
            def dequeue(self):
                \"\"\"Pop the oldest item.

                Raises IndexError when empty.
                \"\"\"
                return self.items.pop(0)
        ";
        let out = edit(code, "Queue.enqueue", EditPosition::After).unwrap();
        assert!(out.contains(
            "    def dequeue(self):\n        \"\"\"Pop the oldest item.\n\n                Raises IndexError when empty.\n                \"\"\"\n        return self.items.pop(0)\n"
        ));
        assert!(parse_valid(&out).is_ok());
    }

    #[test]
    fn test_target_not_found() {
        let result = edit("x = 1", "missing_function", EditPosition::After);
        assert!(matches!(result, Err(HelperError::TargetNotFound(t)) if t == "missing_function"));
    }

    #[test]
    fn test_multiple_targets() {
        let source = "def f():\n    pass\n\nclass A:\n    def f(self):\n        pass\n";
        let result = modify_source(
            source,
            &EditRequest {
                code: "pass".to_string(),
                target: "f".to_string(),
                position: EditPosition::Replace,
            },
        );
        assert!(matches!(result, Err(HelperError::MultipleTargets { count: 2, .. })));
    }

    #[test]
    fn test_invalid_new_code() {
        let result = edit("def broken(:\n    pass", "helper", EditPosition::After);
        assert!(matches!(result, Err(HelperError::InvalidCode(_))));
        let result = edit("   \n", "helper", EditPosition::After);
        assert!(matches!(result, Err(HelperError::InvalidCode(_))));
    }

    #[test]
    fn test_invalid_source() {
        let result = modify_source(
            "def broken(:\n    pass\n",
            &EditRequest {
                code: "x = 1".to_string(),
                target: "broken".to_string(),
                position: EditPosition::After,
            },
        );
        assert!(matches!(result, Err(HelperError::Parse(_))));
    }

    #[test]
    fn test_shared_line_is_rejected() {
        let result = modify_source(
            "a = 1; b = 2\n",
            &EditRequest {
                code: "c = 3".to_string(),
                target: "b".to_string(),
                position: EditPosition::Replace,
            },
        );
        assert!(matches!(result, Err(HelperError::UnsupportedEdit(_))));
    }

    #[test]
    fn test_after_last_line_without_newline() {
        let out = modify_source(
            "x = 1",
            &EditRequest {
                code: "y = 2".to_string(),
                target: "x".to_string(),
                position: EditPosition::After,
            },
        )
        .unwrap();
        assert_eq!(out, "x = 1\ny = 2\n");
    }

    #[test]
    fn test_position_parsing() {
        assert_eq!("before".parse::<EditPosition>().unwrap(), EditPosition::Before);
        assert_eq!("replace".parse::<EditPosition>().unwrap(), EditPosition::Replace);
        assert!(matches!(
            "inside".parse::<EditPosition>(),
            Err(HelperError::InvalidArguments(_))
        ));
        assert_eq!(EditPosition::After.to_string(), "after");
    }

    #[test]
    fn test_edit_file_writes_only_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.py");
        fs::write(&path, SOURCE).unwrap();

        let failed = edit_file(
            &path,
            &EditRequest {
                code: "x = 1".to_string(),
                target: "nope".to_string(),
                position: EditPosition::Before,
            },
        );
        assert!(failed.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);

        let outcome = edit_file(
            &path,
            &EditRequest {
                code: "import sys".to_string(),
                target: "import os".to_string(),
                position: EditPosition::After,
            },
        )
        .unwrap();
        assert_eq!(outcome.lines_after, outcome.lines_before + 1);
        assert!(fs::read_to_string(&path).unwrap().starts_with("import os\nimport sys\n"));
    }
}
