//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// IFCX - Compose and validate federated IFCX layer stacks
#[derive(Parser, Debug)]
#[command(name = "ifcx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a layer stack and print the composed tree
    Compose(commands::compose::ComposeArgs),

    /// Check a layer stack against its effective schema table
    Validate(commands::validate::ValidateArgs),

    /// Print the transitive import graph of a layer
    Tree(commands::tree::TreeArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.log_level)
            .init();

        match self.command {
            Commands::Compose(args) => commands::compose::execute(args),
            Commands::Validate(args) => commands::validate::execute(args),
            Commands::Tree(args) => commands::tree::execute(args),
        }
    }
}
