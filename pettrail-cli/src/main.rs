//! PetTrail CLI - Command-line interface
//!
//! This binary provides a command-line interface to the PetTrail library.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::queue::QueueCommands;
use commands::record::RecordArgs;

#[derive(Parser)]
#[command(name = "pettrail")]
#[command(about = "Record pet walks and deliver them reliably, even offline", long_about = None)]
#[command(version = pettrail::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a walk session until interrupted
    Record(RecordArgs),

    /// Inspect or drain the offline batch queue
    #[command(subcommand)]
    Queue(QueueCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Record(args) => commands::record::run(args).await,
        Commands::Queue(command) => commands::queue::run(command).await,
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
