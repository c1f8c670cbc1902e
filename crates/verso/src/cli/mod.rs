//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the verso binary.

mod commands;
mod inspect;
mod sources;

pub use commands::{Cli, Commands};
pub use inspect::{show_config, show_digest};
pub use sources::handle_source_command;
