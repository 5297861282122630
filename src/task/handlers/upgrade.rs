//! Appliance upgrade handler

use super::{HandlerContext, HandlerError, TaskOutcome};
use crate::task::Task;
use tracing::info;

/// Handle upgradeAppliance
///
/// Only logs receipt; firmware download and apply are not implemented.
pub async fn handle_upgrade_appliance(
    _ctx: &HandlerContext,
    task: &Task,
) -> Result<TaskOutcome, HandlerError> {
    info!(
        "[UPGRADE] Received {} target_version={:?} image={:?} sha256={:?}",
        task.id, task.message.target_version, task.message.image_path, task.message.image_sha256
    );

    Ok(TaskOutcome::Unreported)
}
