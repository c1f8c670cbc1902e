//! Verso CLI binary.
//!
//! This binary provides command-line access to verso:
//! - Compute descriptor digests
//! - Show the resolved configuration
//! - Upload, list and purge sources (with the `postgres` feature)

use clap::Parser;
use verso::{VersoConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, handle_source_command, show_config, show_digest};

    // Load .env for DATABASE_URL
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => VersoConfig::from_file(path)?,
        None => VersoConfig::load()?,
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    init_logging(&logging)?;

    match cli.command {
        Commands::Digest {
            options,
            strict,
            format,
        } => {
            show_digest(&config, &options, strict, format)?;
        }

        Commands::Config => {
            show_config(&config)?;
        }

        Commands::Source(source_cmd) => {
            handle_source_command(&config, source_cmd).await?;
        }
    }

    Ok(())
}
