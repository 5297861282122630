//! Duplicate notice handler

use super::{HandlerContext, HandlerError, TaskOutcome};
use crate::task::Task;
use tracing::info;

/// Handle a redelivered task: nothing runs, the rejection is reported
pub async fn handle_duplicate(_ctx: &HandlerContext, task: &Task) -> Result<TaskOutcome, HandlerError> {
    info!("[DUPLICATE] Ignoring {} ({})", task.id, task.kind);
    Ok(TaskOutcome::Ignored)
}
