// src/lib.rs

pub mod cache;
pub mod clean;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod optimize;
pub mod pipeline;
pub mod project;
pub mod server;
pub mod types;
pub mod watch;

pub use project::{Project, ProjectBuilder};

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_or_default;
use crate::config::model::ConfigFile;
use crate::dag::{TaskGraph, TaskName};

/// High-level entry point used by `main.rs`.
///
/// Resolves the project root and configuration, then either prints the plan
/// (`--dry-run`) or runs the requested task graph.
pub async fn run(args: CliArgs) -> Result<()> {
    let task: TaskName = args.task.parse()?;
    let root = project_root(args.root.as_deref(), args.config.as_deref());
    let cfg = load_or_default(&root, args.config.as_deref())?.with_server_overrides(args.port, args.no_tunnel);

    if args.dry_run {
        print_dry_run(&root, &cfg, task);
        return Ok(());
    }

    info!(task = %task, root = %root.display(), "running task");
    Project::new(root, cfg).run(task).await?;
    Ok(())
}

/// Figure out the project root.
///
/// - `--root` wins.
/// - Otherwise the directory of an explicit config file, unless it is a bare
///   file name.
/// - Otherwise the current working directory.
fn project_root(root: Option<&Path>, config: Option<&Path>) -> PathBuf {
    if let Some(root) = root {
        return root.to_path_buf();
    }
    match config.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the resolved Path Table and the task plan.
fn print_dry_run(root: &Path, cfg: &ConfigFile, task: TaskName) {
    let settings = cfg.settings();
    println!("assetpipe dry-run");
    println!("  root = {}", root.display());
    println!("  config.output_root = {}", settings.output_root);
    println!("  config.cache_dir = {}", settings.cache_dir);
    println!(
        "  config.triggered_while_running_behaviour = {:?}",
        settings.triggered_while_running_behaviour
    );
    println!("  config.debounce_ms = {}", settings.debounce_ms);
    println!("  style.browsers = {:?}", cfg.style().browsers);
    println!();

    println!("paths:");
    for (kind, entry) in cfg.paths().iter() {
        println!("  - {kind}");
        println!("      src: {}", entry.src);
        println!("      dest: {}", entry.dest);
        println!("      watch: {}", entry.watch);
        if let Some(ref maps) = entry.source_maps {
            println!("      source_maps: {maps}");
        }
    }
    println!();

    let graph = TaskGraph::for_task(task);
    println!("task {task} ({} steps):", graph.len());
    for node in graph.topological_order() {
        let deps = graph.dependencies_of(node);
        if deps.is_empty() {
            println!("  - {node}");
        } else {
            let names: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
            println!("  - {node} (after {})", names.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins() {
        let root = project_root(Some(Path::new("site")), Some(Path::new("conf/Assetpipe.toml")));
        assert_eq!(root, PathBuf::from("site"));
    }

    #[test]
    fn config_directory_is_the_fallback_root() {
        let root = project_root(None, Some(Path::new("conf/Assetpipe.toml")));
        assert_eq!(root, PathBuf::from("conf"));
    }

    #[test]
    fn bare_config_name_uses_current_dir() {
        let root = project_root(None, Some(Path::new("Assetpipe.toml")));
        assert_eq!(root, std::env::current_dir().unwrap());
    }
}
