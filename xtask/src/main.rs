//! Project tasks, run with `cargo xtask <task>`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
#[command(name = "cargo xtask", about = "Development tasks for mcp-python-helper")]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    task: Option<Task>,
}

#[derive(Subcommand)]
enum Task {
    /// List available tasks
    Help,
    /// Format, autofix lints, then lint with warnings denied
    Tidy,
    /// Update Cargo.lock and fetch the locked dependencies
    Requirements,
    /// Run the MCP server, forwarding any extra arguments
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

const TASKS: &str = "\
cargo xtask
Development tasks for mcp-python-helper.
USAGE:
    cargo xtask <TASK>
TASKS:
    help            list tasks
    tidy            cargo fmt, clippy --fix, clippy -D warnings
    requirements    cargo update, cargo fetch --locked
    run [ARGS..]    run the mcp-python-helper server";

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = project_root();

    match cli.task.unwrap_or(Task::Help) {
        Task::Help => {
            eprintln!("{}", TASKS);
            Ok(())
        }
        Task::Tidy => {
            cargo(&root, &["fmt", "--all"])?;
            cargo(&root, &["clippy", "--fix", "--allow-dirty", "--allow-staged"])?;
            cargo(&root, &["clippy", "--all-targets", "--", "-D", "warnings"])
        }
        Task::Requirements => {
            cargo(&root, &["update"])?;
            cargo(&root, &["fetch", "--locked"])
        }
        Task::Run { args } => {
            let mut full = vec!["run", "--quiet", "--bin", "mcp-python-helper", "--"];
            full.extend(args.iter().map(String::as_str));
            cargo(&root, &full)
        }
    }
}

/// Workspace root: the parent of this crate's manifest directory.
fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Run a cargo command in `root`. A failing command ends the process with
/// its own exit code.
fn cargo(root: &Path, args: &[&str]) -> Result<()> {
    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    eprintln!("> cargo {}", args.join(" "));
    let status = Command::new(&cargo)
        .args(args)
        .current_dir(root)
        .status()
        .with_context(|| format!("failed to run {}", cargo))?;
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => {
            eprintln!("`cargo {}` failed with {}", args.join(" "), status);
            std::process::exit(code)
        }
        None => bail!("`cargo {}` was terminated by a signal", args.join(" ")),
    }
}
