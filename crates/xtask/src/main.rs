//! Project automation tasks for the Nexus workspace

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Project automation tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format all crates
    Fmt {
        /// Only check formatting
        #[arg(long)]
        check: bool,
    },
    /// Run clippy lints
    Lint,
    /// Run all tests
    Test {
        /// Also run tests that reach live Yahoo Finance
        #[arg(long)]
        live: bool,
    },
    /// Format check, lints and tests, as CI runs them
    Check,
}

fn cargo(args: &[&str]) -> anyhow::Result<()> {
    println!("$ cargo {}", args.join(" "));
    let status = Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()))
        .args(args)
        .status()
        .with_context(|| format!("failed to run cargo {}", args.join(" ")))?;

    if !status.success() {
        bail!("cargo {} failed with {status}", args.join(" "));
    }
    Ok(())
}

fn fmt(check: bool) -> anyhow::Result<()> {
    if check {
        cargo(&["fmt", "--all", "--", "--check"])
    } else {
        cargo(&["fmt", "--all"])
    }
}

fn lint() -> anyhow::Result<()> {
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
}

fn test(live: bool) -> anyhow::Result<()> {
    cargo(&["test", "--workspace"])?;
    if live {
        cargo(&["test", "--workspace", "--", "--ignored"])?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fmt { check } => fmt(check),
        Commands::Lint => lint(),
        Commands::Test { live } => test(live),
        Commands::Check => {
            fmt(true)?;
            lint()?;
            test(false)
        }
    }
}
