//! Appliance metrics collection handler

use super::{HandlerContext, HandlerError, TaskOutcome};
use crate::task::Task;
use tracing::info;

/// Handle collectApplianceMetrics
pub async fn handle_collect_metrics(
    ctx: &HandlerContext,
    task: &Task,
) -> Result<TaskOutcome, HandlerError> {
    info!("[COLLECT] Sampling appliance metrics for {}", task.id);

    let metrics = ctx.metrics.sample().await?;
    info!(
        "[COLLECT] cpu={}x {:.1}% mem={}/{} storage={}/{}",
        metrics.cpu.total,
        metrics.cpu.usage,
        metrics.memory.usage,
        metrics.memory.total,
        metrics.storage.available,
        metrics.storage.total
    );

    Ok(TaskOutcome::Completed(serde_json::to_value(&metrics)?))
}
