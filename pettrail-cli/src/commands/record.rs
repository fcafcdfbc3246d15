//! Record command - run a walk recording session until interrupted.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::signal::unix::{signal, SignalKind};
use pettrail::config::ConfigFile;
use pettrail::ingest::HttpIngestClient;
use pettrail::logging::init_logging;
use pettrail::queue::DurableQueue;
use pettrail::session::{DeliveryNotice, PipelineConfig, PipelineEvent, SessionCoordinator};
use pettrail::source::SimulatedSource;

use crate::error::CliError;

/// Arguments for the record command.
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Pet to record a walk for
    #[arg(long)]
    pub pet: i64,

    /// Starting latitude for the simulated position source
    #[arg(long, default_value = "51.5074")]
    pub lat: f64,

    /// Starting longitude for the simulated position source
    #[arg(long, default_value = "-0.1278")]
    pub lon: f64,

    /// Seconds between position samples
    #[arg(long, default_value = "1")]
    pub sample_interval: u64,
}

/// Run the record command.
pub async fn run(args: RecordArgs) -> Result<(), CliError> {
    let config = ConfigFile::load().map_err(|e| CliError::Config(e.to_string()))?;
    let _guard = init_logging(&config.logging.directory, &config.logging.file_name)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let queue = Arc::new(DurableQueue::open(&config.queue.path)?);
    let client = Arc::new(HttpIngestClient::new(&config.ingest)?);
    let source = Arc::new(SimulatedSource::new(
        args.lat,
        args.lon,
        Duration::from_secs(args.sample_interval.max(1)),
    ));
    let session = SessionCoordinator::new(queue, client, source, PipelineConfig::from(&config));

    spawn_event_printer(&session);

    let walk_id = match session.resume_if_interrupted().await? {
        Some(walk_id) => {
            println!("Resumed interrupted walk {}", walk_id);
            walk_id
        }
        None => {
            let walk_id = session.start_recording(args.pet).await?;
            println!("Recording walk {} for pet {}", walk_id, args.pet);
            walk_id
        }
    };

    let mut sigterm =
        signal(SignalKind::terminate()).map_err(|e| CliError::Signal(e.to_string()))?;

    println!("Press Ctrl+C to stop. SIGTERM hands off buffered points and exits.");
    let terminated = tokio::select! {
        _ = tokio::signal::ctrl_c() => false,
        _ = sigterm.recv() => true,
    };

    if terminated {
        // No time for the full stop path: push the in-memory buffer out in
        // one best-effort submit and leave the session marker in place so
        // the next run resumes walk_id.
        let handed_off = session.shutdown_handoff();
        println!(
            "Terminating: handed off {} buffered point(s); walk {} resumes on next run.",
            handed_off, walk_id
        );
        tokio::time::sleep(Duration::from_millis(500)).await;
        return Ok(());
    }

    println!("Stopping walk {}...", walk_id);
    let summary = session.stop_recording().await?;
    println!(
        "Walk {}: {:.0} m in {:.0} s (average pace {:.2})",
        summary.walk_id, summary.distance, summary.duration, summary.average_pace
    );
    if !summary.badges.is_empty() {
        println!("Badges earned: {}", summary.badges.join(", "));
    }

    let stats = session.recording_stats()?;
    if stats.queued_batches > 0 {
        println!(
            "{} batch(es) could not be delivered and remain queued.",
            stats.queued_batches
        );
        println!("Run 'pettrail queue drain' once you are back online.");
    }

    Ok(())
}

/// Mirror pipeline events to the terminal while recording.
fn spawn_event_printer(session: &SessionCoordinator<HttpIngestClient>) {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                PipelineEvent::Point(p) => {
                    println!("  fix {:.5}, {:.5}", p.latitude, p.longitude);
                }
                PipelineEvent::BatchDelivered {
                    walk_id, accepted, ..
                } => {
                    println!("  delivered batch for walk {} ({} accepted)", walk_id, accepted);
                }
                PipelineEvent::Notice(DeliveryNotice::RetryLimitExceeded {
                    points_lost, ..
                }) => {
                    println!("  gave up on a batch after repeated failures ({} points lost)", points_lost);
                }
                PipelineEvent::Notice(notice) => {
                    println!("  notice: {:?}", notice);
                }
                _ => {}
            }
        }
    });
}
