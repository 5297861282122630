//! Lane queues
//!
//! Four independent unbounded FIFO channels. The router owns the sending half
//! ([`LaneSenders`]) and the worker pool owns the receiving half
//! ([`LaneReceivers`]); nothing else touches either.

use appliance_shared::{TaskMessage, TaskType};
use std::fmt;
use tokio::sync::mpsc;

/// Processing lane a task is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Heartbeat,
    Collect,
    Common,
    /// Redelivered task ids; only a rejection notice is reported
    Duplicate,
}

impl Lane {
    pub const ALL: [Lane; 4] = [Lane::Heartbeat, Lane::Collect, Lane::Common, Lane::Duplicate];
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Heartbeat => write!(f, "heartbeat"),
            Lane::Collect => write!(f, "collect"),
            Lane::Common => write!(f, "common"),
            Lane::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// A task that passed admission control; its id is guaranteed non-empty
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub kind: TaskType,
    pub message: TaskMessage,
}

impl Task {
    /// Validate a message into a task; `None` if it carries no task id
    pub fn from_message(message: TaskMessage) -> Option<Self> {
        let id = message.id()?.to_string();
        Some(Self {
            id,
            kind: message.kind(),
            message,
        })
    }
}

/// Error returned when a lane's worker has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneClosed(pub Lane);

impl fmt::Display for LaneClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lane is closed", self.0)
    }
}

impl std::error::Error for LaneClosed {}

/// Sending half of all four lanes
#[derive(Clone)]
pub struct LaneSenders {
    heartbeat: mpsc::UnboundedSender<Task>,
    collect: mpsc::UnboundedSender<Task>,
    common: mpsc::UnboundedSender<Task>,
    duplicate: mpsc::UnboundedSender<Task>,
}

impl LaneSenders {
    /// Enqueue a task on the given lane
    pub fn send(&self, lane: Lane, task: Task) -> Result<(), LaneClosed> {
        let sender = match lane {
            Lane::Heartbeat => &self.heartbeat,
            Lane::Collect => &self.collect,
            Lane::Common => &self.common,
            Lane::Duplicate => &self.duplicate,
        };
        sender.send(task).map_err(|_| LaneClosed(lane))
    }
}

/// Receiving half of all four lanes
pub struct LaneReceivers {
    pub heartbeat: mpsc::UnboundedReceiver<Task>,
    pub collect: mpsc::UnboundedReceiver<Task>,
    pub common: mpsc::UnboundedReceiver<Task>,
    pub duplicate: mpsc::UnboundedReceiver<Task>,
}

impl LaneReceivers {
    /// Split into `(lane, receiver)` pairs, one per worker
    pub fn into_lanes(self) -> [(Lane, mpsc::UnboundedReceiver<Task>); 4] {
        [
            (Lane::Heartbeat, self.heartbeat),
            (Lane::Collect, self.collect),
            (Lane::Common, self.common),
            (Lane::Duplicate, self.duplicate),
        ]
    }
}

/// Create the four lane channels
pub fn channels() -> (LaneSenders, LaneReceivers) {
    let (heartbeat_tx, heartbeat_rx) = mpsc::unbounded_channel();
    let (collect_tx, collect_rx) = mpsc::unbounded_channel();
    let (common_tx, common_rx) = mpsc::unbounded_channel();
    let (duplicate_tx, duplicate_rx) = mpsc::unbounded_channel();

    (
        LaneSenders {
            heartbeat: heartbeat_tx,
            collect: collect_tx,
            common: common_tx,
            duplicate: duplicate_tx,
        },
        LaneReceivers {
            heartbeat: heartbeat_rx,
            collect: collect_rx,
            common: common_rx,
            duplicate: duplicate_rx,
        },
    )
}
