// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Atrium Operator Tool
//!
//! Entry point for the `atrium-node` binary. Parses CLI arguments, initializes
//! logging and dispatches to a subcommand:
//!
//! - `roles`  : print the role model
//! - `replay` : build a deployment and replay an operation script on it
//! - `version`: print build version information

mod cli;
mod config;
mod logging;
mod replay;

use anyhow::{Context, Result};
use clap::Parser;

use atrium_protocol::access::{Role, RoleRegistry};
use atrium_protocol::Address;

use cli::{AtriumNodeCli, Commands, OutputFormat};
use config::DeploymentConfig;
use logging::LogFormat;
use replay::{Deployment, Outcome};

fn main() -> Result<()> {
    let cli = AtriumNodeCli::parse();
    logging::init_logging(
        "atrium_node=info,atrium_contracts=warn,atrium_protocol=warn",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    match cli.command {
        Commands::Roles => print_roles(),
        Commands::Replay(args) => run_replay(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Prints every role with its identifier and the admin role it has after
/// initialization.
fn print_roles() -> Result<()> {
    let mut registry = RoleRegistry::new();
    registry
        .initialize(Address::ZERO)
        .context("failed to initialize scratch registry")?;

    for role in Role::ALL {
        println!(
            "{:<28} {}  admin={}",
            role.name(),
            role.id(),
            registry.get_role_admin(role)
        );
    }
    Ok(())
}

/// Loads a deployment and a script, replays it and prints every outcome
/// followed by a summary.
fn run_replay(args: cli::ReplayArgs) -> Result<()> {
    let config = DeploymentConfig::load(&args.deployment)?;
    let operations = replay::load_script(&args.script)?;
    tracing::info!(
        deployment = %args.deployment.display(),
        script = %args.script.display(),
        operations = operations.len(),
        "starting replay"
    );

    let mut deployment = Deployment::build(&config)?;
    let outcomes = deployment.replay(&operations);
    for outcome in &outcomes {
        print_outcome(outcome, args.format)?;
    }

    let summary = deployment.summary(&outcomes);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        OutputFormat::Pretty => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "replay finished"
    );
    Ok(())
}

fn print_outcome(outcome: &Outcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(outcome)?),
        OutputFormat::Pretty => match (&outcome.result, &outcome.error) {
            (_, Some(error)) => println!("#{:<4} {:<22} FAILED  {}", outcome.step, outcome.op, error),
            (Some(result), None) => println!(
                "#{:<4} {:<22} ok      {}",
                outcome.step,
                outcome.op,
                serde_json::to_string(result)?
            ),
            (None, None) => println!("#{:<4} {:<22} ok", outcome.step, outcome.op),
        },
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("atrium-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", atrium_protocol::config::PROTOCOL_VERSION);
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
