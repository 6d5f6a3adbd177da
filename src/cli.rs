// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build, optimise and serve the assets of a static site.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run: `build`, `dev`, `watch`, `clean`, `clear`, or one of the
    /// per-kind tasks (`html:build`, `style:build`, `script:build`,
    /// `fonts:build`, `images:build`, `other:build`).
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Assetpipe.toml` in the project root, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root against which every path in the config is resolved.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate the config, print the path table and task plan, but
    /// don't touch the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not request a public tunnel URL for the dev server.
    #[arg(long)]
    pub no_tunnel: bool,

    /// Override the dev server port from `[server].port`.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_defaults_to_default() {
        let args = CliArgs::parse_from(["assetpipe"]);
        assert_eq!(args.task, "default");
        assert!(!args.dry_run);
        assert!(args.port.is_none());
    }

    #[test]
    fn parses_task_and_overrides() {
        let args = CliArgs::parse_from([
            "assetpipe",
            "style:build",
            "--root",
            "site",
            "--no-tunnel",
            "--port",
            "8080",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.task, "style:build");
        assert_eq!(args.root, Some(PathBuf::from("site")));
        assert!(args.no_tunnel);
        assert_eq!(args.port, Some(8080));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
