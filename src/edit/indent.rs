//! Indentation helpers for rendering inserted code.

use std::collections::HashSet;
use tree_sitter::Tree;

use crate::error::Result;
use crate::parser::parse;

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Leading spaces and tabs of a line.
pub fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Rows (0-indexed) that begin inside a multi-line string literal. Their
/// leading whitespace is part of the literal's value.
pub fn literal_rows(tree: &Tree) -> HashSet<usize> {
    let mut rows = HashSet::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.kind() == "string" {
            let (first, last) = (node.start_position().row, node.end_position().row);
            rows.extend(first + 1..=last);
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
    rows
}

/// Remove the whitespace prefix shared by all non-blank lines, turn blank
/// lines into empty ones and drop leading/trailing blank lines.
///
/// Lines inside multi-line string literals are kept verbatim.
pub fn dedent(code: &str) -> Result<String> {
    let lines: Vec<&str> = code.lines().collect();

    // String rows are found on a copy shifted by the first line's indent.
    // Stripping line prefixes never moves a row.
    let base = lines
        .iter()
        .find(|line| !line.trim().is_empty())
        .map_or("", |line| leading_whitespace(line));
    let rough = lines
        .iter()
        .map(|&line| line.strip_prefix(base).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n");
    let literal = literal_rows(&parse(&rough)?);
    let dedented = strip_common_prefix(&lines, &literal);

    let first = dedented.iter().position(|l| !l.is_empty());
    let last = dedented.iter().rposition(|l| !l.is_empty());
    Ok(match (first, last) {
        (Some(first), Some(last)) => dedented[first..=last].join("\n"),
        _ => String::new(),
    })
}

/// Prefix every non-blank line with `indent`, except rows listed in
/// `literal`. The result ends with a newline.
pub fn indent_lines(code: &str, indent: &str, literal: &HashSet<usize>) -> String {
    let mut out = String::with_capacity(code.len() + indent.len() * 4);
    for (row, line) in code.lines().enumerate() {
        if literal.contains(&row) {
            out.push_str(line);
        } else if !line.trim().is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

fn strip_common_prefix<'a>(lines: &[&'a str], keep: &HashSet<usize>) -> Vec<&'a str> {
    let mut common: Option<&str> = None;
    for (row, line) in lines.iter().enumerate() {
        if keep.contains(&row) || line.trim().is_empty() {
            continue;
        }
        let ws = leading_whitespace(line);
        common = Some(match common {
            None => ws,
            Some(prev) => common_prefix(prev, ws),
        });
    }
    let strip = common.map_or(0, str::len);

    lines
        .iter()
        .enumerate()
        .map(|(row, &line)| {
            if keep.contains(&row) {
                line
            } else if line.trim().is_empty() {
                ""
            } else {
                &line[strip..]
            }
        })
        .collect()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, ca), cb)| ca == cb)
        .last()
        .map_or(0, |((i, ca), _)| i + ca.len_utf8());
    &a[..len]
}
