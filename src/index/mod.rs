//! Workspace symbol index.
//!
//! An in-memory table of every Python definition under a directory, with
//! name lookup modelled on an editor's "go to symbol in workspace".

pub mod builder;
pub mod types;

use std::collections::HashMap;

pub use builder::{build_index, python_files};
pub use types::{SymbolKind, SymbolLocation};

/// All symbols of a workspace plus a name index.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    symbols: Vec<SymbolLocation>,
    /// Index: symbol name -> positions in `symbols`.
    by_name: HashMap<String, Vec<usize>>,
    file_count: usize,
}

impl SymbolIndex {
    pub fn new(file_count: usize, symbols: Vec<SymbolLocation>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, symbol) in symbols.iter().enumerate() {
            by_name.entry(symbol.name.clone()).or_default().push(i);
        }
        Self {
            symbols,
            by_name,
            file_count,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Search for symbols by name. Returns up to `limit` results.
    ///
    /// A dotted query (`MyClass.method`) matches qualified names exactly.
    /// Otherwise exact name matches win; without any, names containing the
    /// query case-insensitively are returned, prefix matches first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&SymbolLocation> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &SymbolLocation)> = if query.contains('.') {
            self.symbols
                .iter()
                .filter(|s| s.qualified_name() == query)
                .map(|s| (0, s))
                .collect()
        } else if let Some(indexes) = self.by_name.get(query) {
            indexes.iter().map(|&i| (0, &self.symbols[i])).collect()
        } else {
            let query_lower = query.to_lowercase();
            self.symbols
                .iter()
                .filter_map(|s| {
                    let name = s.name.to_lowercase();
                    if name.starts_with(&query_lower) {
                        Some((1, s))
                    } else if name.contains(&query_lower) {
                        Some((2, s))
                    } else {
                        None
                    }
                })
                .collect()
        };

        scored.sort_by(|(ra, a), (rb, b)| {
            ra.cmp(rb)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.line.cmp(&b.line))
                .then_with(|| a.column.cmp(&b.column))
        });

        scored.into_iter().take(limit).map(|(_, s)| s).collect()
    }
}
