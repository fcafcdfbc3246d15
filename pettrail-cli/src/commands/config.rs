//! Configuration management CLI commands.

use clap::Subcommand;
use pettrail::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Create the configuration file with defaults if it doesn't exist
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
        ConfigCommands::Init => {
            let path = ConfigFile::ensure_exists().map_err(|e| CliError::Config(e.to_string()))?;
            println!("Configuration file: {}", path.display());
            Ok(())
        }
    }
}
