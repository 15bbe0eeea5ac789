use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "headerguard")]
#[command(about = "Passive security checks for captured HTTP exchanges")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "headerguard.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan captured exchanges (JSON: one exchange or an array of them)
    Scan {
        /// Exchange files to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// List registered detectors
    Rules,
    /// Validate the config file and compile its patterns
    CheckConfig,
    /// Write a default config file
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON alert per line
    Json,
    /// Human-readable table
    Text,
}
