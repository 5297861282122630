//! Heartbeat handler

use super::{HandlerContext, HandlerError, TaskOutcome};
use crate::task::Task;
use serde_json::json;
use tracing::debug;

/// Handle heartbeat
///
/// Reports the whole service registry as a liveness and inventory signal.
pub async fn handle_heartbeat(ctx: &HandlerContext, task: &Task) -> Result<TaskOutcome, HandlerError> {
    let services = ctx.registry.snapshot().await;
    debug!("[HEARTBEAT] {} reporting {} services", task.id, services.len());

    Ok(TaskOutcome::Completed(json!({ "services": services })))
}
