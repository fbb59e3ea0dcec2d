//! Session countdown — one background task per session, ticking once a second.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::assessment::models::FinalSummary;
use crate::assessment::session::{AssessmentSession, TickOutcome};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns the countdown. The task exits on its own once the session closes,
/// either by reaching zero here or by an explicit finalize elsewhere.
pub fn spawn_countdown(session: Arc<Mutex<AssessmentSession>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        // The first tick of a tokio interval completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            let outcome = session.lock().await.tick(Utc::now());
            match outcome {
                TickOutcome::Running { remaining } => {
                    if remaining % 60 == 0 {
                        debug!("{remaining}s left on the clock");
                    }
                }
                TickOutcome::Expired(summary) => {
                    info!("Session {} timed out", summary.session_id);
                    log_summary(&summary);
                    break;
                }
                TickOutcome::Ignored => {
                    debug!("Countdown stopped: session already closed");
                    break;
                }
            }
        }
    })
}

pub fn log_summary(summary: &FinalSummary) {
    match serde_json::to_string(summary) {
        Ok(json) => info!(
            session_id = %summary.session_id,
            total_score = summary.total_score,
            max_score = summary.max_score,
            "Final interview results: {json}"
        ),
        Err(e) => info!(
            session_id = %summary.session_id,
            "Final interview results (unserializable: {e})"
        ),
    }
}
