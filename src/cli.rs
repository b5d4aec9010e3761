//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// visitrack - visitor session and referral attribution engine
#[derive(Parser, Debug)]
#[command(name = "visitrack")]
#[command(version)]
#[command(about = "Visitor session and referral attribution engine", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Generate an example configuration file
    GenerateConfig {
        /// Output path (default: print to stdout)
        #[arg(long, short = 'o')]
        output: Option<String>,
    },
}

impl Cli {
    /// Command to run, `serve` when none was given
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}
