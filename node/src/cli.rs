//! # CLI Interface
//!
//! Defines the command-line argument structure for `atrium-node` using
//! `clap` derive. Supports three subcommands: `roles`, `replay` and
//! `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Atrium operator tool.
///
/// Inspects the role model and replays operation scripts against a fresh
/// in-memory deployment of the settlement engine.
#[derive(Parser, Debug)]
#[command(
    name = "atrium-node",
    about = "Atrium settlement engine operator tool",
    version,
    propagate_version = true
)]
pub struct AtriumNodeCli {
    /// Log output format: "pretty" or "json".
    #[arg(long, global = true, env = "ATRIUM_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Atrium binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every role, its identifier and its admin role.
    Roles,
    /// Build a deployment from a file and replay an operation script on it.
    Replay(ReplayArgs),
    /// Print version information and exit.
    Version,
}

/// How replay outcomes are printed on stdout.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line of text per operation.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Arguments for the `replay` subcommand.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Deployment description (JSON).
    #[arg(long, short = 'd', env = "ATRIUM_DEPLOYMENT")]
    pub deployment: PathBuf,

    /// Operation script (JSON array).
    #[arg(long, short = 's')]
    pub script: PathBuf,

    /// Output format for outcomes and the final summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        AtriumNodeCli::command().debug_assert();
    }

    #[test]
    fn replay_args_parse() {
        let cli = AtriumNodeCli::try_parse_from([
            "atrium-node",
            "replay",
            "--deployment",
            "deploy.json",
            "-s",
            "ops.json",
            "--format",
            "pretty",
        ])
        .unwrap();
        match cli.command {
            Commands::Replay(args) => {
                assert_eq!(args.deployment, PathBuf::from("deploy.json"));
                assert_eq!(args.script, PathBuf::from("ops.json"));
                assert_eq!(args.format, OutputFormat::Pretty);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
