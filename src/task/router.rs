//! Task router - admission control and lane classification
//!
//! Order of checks for every inbound message:
//! 1. no task id: drop
//! 2. heartbeat: heartbeat lane, never deduplicated
//! 3. already seen: duplicate lane
//! 4. admit, then collect lane for metrics, common lane for everything else

use super::dedup::DedupCache;
use super::lanes::{Lane, LaneClosed, LaneSenders, Task};
use appliance_shared::{codec, TaskMessage, TaskType};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why a message was not enqueued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingTaskId,
}

/// Result of routing one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Enqueued(Lane),
    Dropped(DropReason),
}

/// Errors raised while routing
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] codec::CodecError),

    #[error(transparent)]
    LaneClosed(#[from] LaneClosed),
}

/// Routes validated tasks onto lanes
pub struct TaskRouter {
    dedup: Arc<DedupCache>,
    lanes: LaneSenders,
}

impl TaskRouter {
    pub fn new(dedup: Arc<DedupCache>, lanes: LaneSenders) -> Self {
        Self { dedup, lanes }
    }

    /// Decode a raw broker payload and route it
    pub fn route(&self, payload: &[u8]) -> Result<RouteOutcome, RouteError> {
        let message = codec::decode(payload)?;
        self.route_message(message)
    }

    /// Route an already decoded message
    pub fn route_message(&self, message: TaskMessage) -> Result<RouteOutcome, RouteError> {
        let Some(task) = Task::from_message(message) else {
            debug!("[ROUTER] Dropping message without task_id");
            return Ok(RouteOutcome::Dropped(DropReason::MissingTaskId));
        };

        let lane = self.classify(&task);
        debug!("[ROUTER] Task {} ({}) -> {} lane", task.id, task.kind, lane);

        if lane == Lane::Duplicate {
            info!("[ROUTER] Duplicate task {} ({}), not executing", task.id, task.kind);
        }

        self.lanes.send(lane, task)?;
        Ok(RouteOutcome::Enqueued(lane))
    }

    /// Pick a lane, admitting the id to the dedup cache when appropriate
    fn classify(&self, task: &Task) -> Lane {
        if task.kind == TaskType::Heartbeat {
            return Lane::Heartbeat;
        }

        // Admission happens before execution so near-simultaneous redeliveries
        // cannot both pass the check
        if !self.dedup.try_admit(&task.id) {
            return Lane::Duplicate;
        }

        match task.kind {
            TaskType::CollectApplianceMetrics => Lane::Collect,
            _ => Lane::Common,
        }
    }
}
