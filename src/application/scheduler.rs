//! Periodic scheduled-publication sweep.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::application::posts::PostService;

/// Spawn a task that publishes due posts every `cadence`.
///
/// The first sweep runs one full period after start-up; the HTTP endpoint
/// and the `publish-scheduled` command cover immediate needs.
pub fn spawn_publication_sweep(posts: PostService, cadence: Duration) -> JoinHandle<()> {
    info!(cadence_seconds = cadence.as_secs(), "publication sweep scheduled");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cadence);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            if let Err(err) = posts.publish_scheduled().await {
                error!(error = %err, "scheduled publication sweep failed");
            }
        }
    })
}
