//! Background housekeeping on the poll interval: presence forfeits, retried
//! settlements, idle puzzle runs, finished sessions.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::store::{SessionStore, FINISHED_RETENTION};
use crate::puzzle::PuzzleStore;

pub fn spawn(
    sessions: SessionStore,
    puzzles: PuzzleStore,
    interval: Duration,
    puzzle_ttl: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let forfeited = sessions.sweep_presence(Instant::now());
                    if !forfeited.is_empty() {
                        info!(count = forfeited.len(), "absent players forfeited");
                    }
                    let settled = sessions.settle_pending();
                    if settled > 0 {
                        info!(settled, "pending settlements retried");
                    }
                    puzzles.prune_old(puzzle_ttl);
                    let pruned = sessions.prune_finished(FINISHED_RETENTION);
                    if pruned > 0 {
                        debug!(pruned, "finished sessions pruned");
                    }
                }
            }
        }
        debug!("sweeper stopped");
    })
}
