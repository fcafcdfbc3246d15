//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use pettrail::ingest::IngestError;
use pettrail::queue::QueueError;
use pettrail::session::SessionError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Durable queue error
    Storage(QueueError),
    /// Session lifecycle error
    Session(SessionError),
    /// Ingestion client error
    Client(IngestError),
    /// Failed to install a signal handler
    Signal(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Session(SessionError::Ingest(IngestError::Transient(_)))
            | CliError::Client(IngestError::Transient(_)) => {
                eprintln!();
                eprintln!("The ingestion service is unreachable. Check:");
                eprintln!("  1. Your network connection");
                eprintln!("  2. The base_url in your config (pettrail config path)");
                eprintln!("Queued batches are kept and delivered on the next run.");
            }
            CliError::Session(SessionError::AlreadyRecording) => {
                eprintln!();
                eprintln!("Stop the active recording first, or use force-stop to abandon it.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Storage(e) => write!(f, "Queue error: {}", e),
            CliError::Session(e) => write!(f, "Session error: {}", e),
            CliError::Client(e) => write!(f, "Ingestion client error: {}", e),
            CliError::Signal(msg) => write!(f, "Failed to install signal handler: {}", msg),
        }
    }
}

impl From<QueueError> for CliError {
    fn from(e: QueueError) -> Self {
        CliError::Storage(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}

impl From<IngestError> for CliError {
    fn from(e: IngestError) -> Self {
        CliError::Client(e)
    }
}
