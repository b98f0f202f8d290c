//! Symbol lookup against the sample project fixture.

use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use mcp_python_helper::config::LocateConfig;
use mcp_python_helper::mcp::{call_tool, ToolContext, LOCATE_TOOL};
use mcp_python_helper::{build_index, locate_symbol, IndexLocator, SymbolKind};

fn sample_project() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_project")
}

async fn locate(symbol: &str) -> String {
    let locator = IndexLocator::new(LocateConfig::default());
    locate_symbol(&locator, &sample_project(), symbol)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_locate_class() {
    assert_eq!(
        locate("MyClass").await,
        "Found MyClass (class) in:\n  File: main.py\n  Line 4, Column 7"
    );
}

#[tokio::test]
async fn test_locate_function() {
    let text = locate("my_function").await;
    assert!(text.contains("my_function (function)"));
    assert!(text.contains("main.py"));
    assert!(text.contains("Line 12, Column 5"));
}

#[tokio::test]
async fn test_locate_multiple_symbols() {
    let text = locate("method").await;
    assert!(text.contains("my_method"));
    assert!(text.contains("another_method"));
    assert_eq!(text.matches("main.py").count(), 2);
    assert_eq!(text.split("\n\n").count(), 2);
}

#[tokio::test]
async fn test_locate_qualified_method() {
    assert_eq!(
        locate("OtherClass.another_method").await,
        "Found another_method (method) in:\n  File: main.py\n  Line 20, Column 9"
    );
}

#[tokio::test]
async fn test_locate_nonexistent_symbol() {
    assert_eq!(
        locate("NonExistentSymbol").await,
        "No definitions found for symbol 'NonExistentSymbol'"
    );
}

#[tokio::test]
async fn test_locate_through_tool_call() {
    let ctx = ToolContext::new(Arc::new(IndexLocator::new(LocateConfig::default())));
    let result = call_tool(
        &ctx,
        LOCATE_TOOL,
        &json!({
            "symbol": "CONSTANT",
            "workspace_root": sample_project().to_string_lossy(),
        }),
    )
    .await;

    assert!(!result.is_error());
    assert_eq!(
        result.joined_text(),
        "Found CONSTANT (constant) in:\n  File: main.py\n  Line 16, Column 1"
    );
}

#[test]
fn test_index_contents() {
    let index = build_index(&sample_project(), &LocateConfig::default());
    assert_eq!(index.file_count(), 1);

    let kinds: Vec<(String, SymbolKind)> = index
        .search("MyClass.my_method", 10)
        .into_iter()
        .map(|s| (s.qualified_name(), s.kind))
        .collect();
    assert_eq!(kinds, [("MyClass.my_method".to_string(), SymbolKind::Method)]);

    // Instance attributes and locals are not definitions.
    assert!(index.search("value", 10).is_empty());
}
