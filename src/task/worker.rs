//! Worker pool - one long-lived worker per lane

use super::executor::LaneExecutor;
use super::lanes::{Lane, LaneReceivers, Task};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Handles to the four lane workers
pub struct WorkerPool {
    workers: Vec<(Lane, JoinHandle<()>)>,
}

impl WorkerPool {
    /// Spawn one worker per lane, all sharing `executor`
    pub fn spawn<E: LaneExecutor>(receivers: LaneReceivers, executor: Arc<E>) -> Self {
        let workers = receivers
            .into_lanes()
            .into_iter()
            .map(|(lane, rx)| {
                let executor = executor.clone();
                let handle = tokio::spawn(async move {
                    run_lane(lane, rx, executor).await;
                });
                (lane, handle)
            })
            .collect();

        Self { workers }
    }

    /// Lanes whose worker is still running
    pub fn running(&self) -> Vec<Lane> {
        self.workers
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(lane, _)| *lane)
            .collect()
    }

    /// Wait for every worker to exit (after the lanes are closed)
    pub async fn join(self) {
        for (lane, handle) in self.workers {
            if let Err(e) = handle.await {
                error!("[WORKER] {} lane worker ended abnormally: {}", lane, e);
            }
        }
    }
}

/// Drain one lane until its channel closes.
///
/// Items run strictly one at a time in arrival order. A failing or panicking
/// task is logged and the loop moves on to the next item.
pub async fn run_lane<E: LaneExecutor>(lane: Lane, mut rx: UnboundedReceiver<Task>, executor: Arc<E>) {
    info!("[WORKER] {} lane started", lane);

    while let Some(task) = rx.recv().await {
        let task_id = task.id.clone();
        let result = AssertUnwindSafe(executor.execute(lane, task))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(outcome)) => {
                debug!("[WORKER] {} lane: {} done ({:?})", lane, task_id, outcome);
            }
            Ok(Err(e)) => {
                error!("[WORKER] {} lane: {} failed: {}", lane, task_id, e);
            }
            Err(_) => {
                error!("[WORKER] {} lane: {} panicked, continuing", lane, task_id);
            }
        }
    }

    warn!("[WORKER] {} lane closed", lane);
}
