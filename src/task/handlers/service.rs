//! Service lifecycle handlers (install, uninstall, configure)

use super::{HandlerContext, HandlerError, TaskOutcome};
use crate::service::ServiceInstall;
use crate::task::Task;
use serde_json::json;
use tracing::info;

fn service_code(task: &Task) -> Result<&str, HandlerError> {
    task.message
        .service_code()?
        .filter(|code| !code.is_empty())
        .ok_or(HandlerError::MissingField("service_code"))
}

/// Handle installService
///
/// Installation always succeeds; there is no rollback path.
pub async fn handle_install_service(
    ctx: &HandlerContext,
    task: &Task,
) -> Result<TaskOutcome, HandlerError> {
    let code = service_code(task)?;
    let install = ServiceInstall {
        version: task.message.target_version()?.map(str::to_string),
        image_path: task.message.image_path()?.map(str::to_string),
        image_sha256: task.message.image_sha256()?.map(str::to_string),
    };

    info!(
        "[INSTALL] {} version={:?} image={:?}",
        code, install.version, install.image_path
    );

    let record = ctx.registry.upsert(code, install).await;
    Ok(TaskOutcome::Completed(json!({ "serviceCode": code, "service": record })))
}

/// Handle uninstallService
pub async fn handle_uninstall_service(
    ctx: &HandlerContext,
    task: &Task,
) -> Result<TaskOutcome, HandlerError> {
    let code = service_code(task)?;
    let removed = ctx.registry.remove(code).await.is_some();

    if removed {
        info!("[UNINSTALL] {} removed", code);
    } else {
        info!("[UNINSTALL] {} was not installed", code);
    }

    Ok(TaskOutcome::Completed(json!({ "serviceCode": code, "removed": removed })))
}

/// Handle configureService
///
/// `body` is shallow-merged into the existing settings.
pub async fn handle_configure_service(
    ctx: &HandlerContext,
    task: &Task,
) -> Result<TaskOutcome, HandlerError> {
    let code = service_code(task)?;
    if task.message.body.is_none() {
        return Err(HandlerError::MissingField("body"));
    }
    let body = task.message.body_object().ok_or(HandlerError::InvalidField {
        field: "body",
        expected: "an object",
    })?;

    info!("[CONFIGURE] {} received {} settings", code, body.len());

    let settings = ctx.registry.merge(code, body).await;
    Ok(TaskOutcome::Completed(json!({ "serviceCode": code, "settings": settings })))
}
