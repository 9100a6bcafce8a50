//! CLI argument parsing with clap derive

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fleet_agent::commands;
use fleet_agent::infra::AgentConfig;

/// Build agent identity bootstrap
#[derive(Parser)]
#[command(
    name = "fleet-agent",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register with the coordinator unless already registered
    Register,

    /// Show registration state and the stored agent certificate
    Status,

    /// Discard the agent certificate so the next start registers again
    Invalidate,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli { json, command } = self;
        let config = AgentConfig::from_env()?;
        tracing::debug!(?config, "configuration loaded");

        match command {
            Command::Register => {
                let task = tokio::task::spawn_blocking(move || commands::register::run(&config));
                tokio::select! {
                    joined = task => joined.context("registration task panicked")?,
                    signal = tokio::signal::ctrl_c() => {
                        signal.context("cannot listen for Ctrl-C")?;
                        tracing::warn!("registration interrupted");
                        anyhow::bail!("registration interrupted")
                    }
                }
            }
            Command::Status => commands::status::run(&config, json),
            Command::Invalidate => {
                commands::invalidate::run(&config, json);
                Ok(())
            }
        }
    }
}
