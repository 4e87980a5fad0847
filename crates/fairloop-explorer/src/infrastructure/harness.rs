//! Background execution of engines on the tokio blocking pool
//!
//! Engines are synchronous: every iteration drives the program under test on
//! the calling thread. The harness moves a run onto
//! [`tokio::task::spawn_blocking`] so async hosts can await it, cancel it,
//! or bound it by the configured timeout.
//!
//! Cancellation is cooperative and takes effect at the next iteration
//! boundary; an iteration in progress always completes.

use crate::adapters::engine::{CancellationToken, Engine};
use crate::domain::error::{EngineError, EngineResult};
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

/// Extra time granted past the configured timeout before cancelling
pub const TIMEOUT_GRACE: Duration = Duration::from_millis(250);

/// Engine run in progress on the blocking pool
pub struct BackgroundRun<R> {
    cancel: CancellationToken,
    task: JoinHandle<EngineResult<R>>,
}

impl<R: Send + 'static> BackgroundRun<R> {
    /// Start `engine` on the blocking pool
    pub fn spawn<E>(mut engine: E) -> Self
    where
        E: Engine<Report = R> + 'static,
    {
        let cancel = engine.cancellation_token();
        let task = tokio::task::spawn_blocking(move || engine.run());
        Self { cancel, task }
    }

    /// Ask the engine to stop after its current iteration
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token controlling the run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the run to end
    pub async fn join(self) -> EngineResult<R> {
        flatten(self.task.await)
    }

    /// Wait at most `limit`, then cancel and wait for the run to wind down
    pub async fn join_within(mut self, limit: Duration) -> EngineResult<R> {
        match tokio::time::timeout(limit, &mut self.task).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                warn!(target: "fairloop::engine", "⏱️  Engine exceeded {:?}, cancelling", limit);
                self.cancel.cancel();
                flatten(self.task.await)
            }
        }
    }
}

fn flatten<R>(joined: Result<EngineResult<R>, JoinError>) -> EngineResult<R> {
    match joined {
        Ok(result) => result,
        Err(err) if err.is_cancelled() => Err(EngineError::Cancelled),
        Err(err) => Err(EngineError::Harness(err.to_string())),
    }
}

/// Run `engine` in the background, bounded by its configured timeout
pub async fn run_in_background<E>(engine: E) -> EngineResult<E::Report>
where
    E: Engine + 'static,
{
    let limit = engine.timeout();
    info!(target: "fairloop::engine", "🧵 Running engine in background (timeout {:?})", limit);

    let run = BackgroundRun::spawn(engine);
    match limit {
        Some(limit) => run.join_within(limit + TIMEOUT_GRACE).await,
        None => run.join().await,
    }
}
