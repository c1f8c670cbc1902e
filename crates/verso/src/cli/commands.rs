//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Verso - derive media variants once and reuse them
#[derive(Parser, Debug)]
#[command(name = "verso")]
#[command(about = "Derive media variants once and reuse them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the canonical form and digest of transformation options
    Digest {
        /// Options as NAME=VALUE pairs; values are parsed as JSON when possible
        #[arg(value_name = "NAME=VALUE")]
        options: Vec<String>,

        /// Apply the configured strict option policy
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Print the resolved configuration
    Config,

    /// Manage stored sources (requires the `postgres` feature)
    #[command(subcommand)]
    Source(SourceCommands),
}

/// Source management subcommands
#[derive(Subcommand, Debug)]
pub enum SourceCommands {
    /// Store a file as a new source
    Upload {
        /// File to upload
        file: PathBuf,

        /// Partition to store it on (defaults to the configured one)
        #[arg(long)]
        partition: Option<String>,
    },

    /// List the variants derived from a source
    Variants {
        /// Source blob id
        source_id: uuid::Uuid,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Delete a source together with its variants
    Purge {
        /// Source blob id
        source_id: uuid::Uuid,
    },
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
