//! Index builder: scans a directory and extracts Python symbols.
//!
//! Walks source files respecting .gitignore, parses each with tree-sitter
//! in parallel and assembles a [`SymbolIndex`].

use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::SymbolIndex;
use crate::config::LocateConfig;
use crate::parser::{extract_symbols, is_python_file};

/// Build a symbol index from all Python files below `root`.
///
/// Hidden directories, ignored paths and any directory named in
/// `config.exclude_dirs` are skipped. Files that cannot be read are
/// skipped with a debug log.
pub fn build_index(root: &Path, config: &LocateConfig) -> SymbolIndex {
    let files = python_files(root, &config.exclude_dirs);

    let symbols: Vec<_> = files
        .par_iter()
        .filter_map(|path| match fs::read_to_string(path) {
            Ok(source) => match extract_symbols(path, &source) {
                Ok(symbols) => Some(symbols),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unparsable file");
                    None
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable file");
                None
            }
        })
        .flatten()
        .collect();

    info!(
        root = %root.display(),
        files = files.len(),
        symbols = symbols.len(),
        "symbol index built"
    );

    SymbolIndex::new(files.len(), symbols)
}

/// List the Python files an index build would parse.
pub fn python_files(root: &Path, exclude_dirs: &[String]) -> Vec<PathBuf> {
    let exclude: Vec<String> = exclude_dirs.to_vec();

    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| exclude.iter().any(|e| e == name)))
        })
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| is_python_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}
