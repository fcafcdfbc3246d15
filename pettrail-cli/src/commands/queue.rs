//! Offline queue inspection and manual draining.

use std::sync::Arc;

use clap::Subcommand;
use pettrail::config::ConfigFile;
use pettrail::drain::DrainEngine;
use pettrail::ingest::HttpIngestClient;
use pettrail::queue::DurableQueue;
use pettrail::time::ms_to_rfc3339;
use tokio::sync::broadcast;

use crate::error::CliError;

/// Queue subcommands.
#[derive(Debug, Subcommand)]
pub enum QueueCommands {
    /// Show queued batch counts and any interrupted session
    Stats,

    /// Attempt delivery of every ready batch now
    Drain,
}

/// Run a queue subcommand.
pub async fn run(command: QueueCommands) -> Result<(), CliError> {
    let config = ConfigFile::load().map_err(|e| CliError::Config(e.to_string()))?;
    let queue = Arc::new(DurableQueue::open(&config.queue.path)?);

    match command {
        QueueCommands::Stats => run_stats(&config, &queue),
        QueueCommands::Drain => run_drain(&config, queue).await,
    }
}

fn run_stats(config: &ConfigFile, queue: &DurableQueue) -> Result<(), CliError> {
    println!("Queue store:     {}", config.queue.path.display());
    println!("Queued batches:  {}", queue.count_all()?);

    match queue.load_session_state()? {
        Some(state) if state.is_recording => {
            println!(
                "Interrupted walk: {} (started {})",
                state.walk_id,
                ms_to_rfc3339(state.started_at_ms)
            );
            println!("Run 'pettrail record' to resume it.");
        }
        _ => println!("Interrupted walk: none"),
    }

    Ok(())
}

async fn run_drain(config: &ConfigFile, queue: Arc<DurableQueue>) -> Result<(), CliError> {
    let client = Arc::new(HttpIngestClient::new(&config.ingest)?);
    let (events, _rx) = broadcast::channel(64);
    let engine = Arc::new(DrainEngine::new(
        Arc::clone(&queue),
        client,
        config.delivery.drain_settings(),
        events,
    ));

    let before = queue.count_all()?;
    if before == 0 {
        println!("Queue is empty.");
        return Ok(());
    }

    println!("Draining {} queued batch(es)...", before);
    engine.run_pass().await;

    let after = queue.count_all()?;
    println!(
        "Done: {} resolved, {} remaining (not yet due or still failing)",
        before.saturating_sub(after),
        after
    );
    Ok(())
}
