//! Task executor - dispatches dequeued tasks to handlers and reports outcomes

use super::handlers::{self, HandlerContext, HandlerError, TaskOutcome};
use super::lanes::{Lane, Task};
use crate::report::Reporter;
use appliance_shared::{TaskReport, TaskType};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors surfaced to the lane worker for a single task
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("unknown task type {0:?}")]
    UnknownType(String),

    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
}

/// Executes one task taken off a lane
#[async_trait]
pub trait LaneExecutor: Send + Sync + 'static {
    async fn execute(&self, lane: Lane, task: Task) -> Result<TaskOutcome, TaskError>;
}

/// Production executor: handler dispatch plus best-effort reporting
pub struct TaskExecutor {
    ctx: HandlerContext,
    reporter: Arc<dyn Reporter>,
}

impl TaskExecutor {
    pub fn new(ctx: HandlerContext, reporter: Arc<dyn Reporter>) -> Self {
        Self { ctx, reporter }
    }

    async fn dispatch(&self, lane: Lane, task: &Task) -> Result<TaskOutcome, TaskError> {
        if lane == Lane::Duplicate {
            return Ok(handlers::handle_duplicate(&self.ctx, task).await?);
        }

        let result = match &task.kind {
            TaskType::Heartbeat => handlers::handle_heartbeat(&self.ctx, task).await,
            TaskType::CollectApplianceMetrics => {
                handlers::handle_collect_metrics(&self.ctx, task).await
            }
            TaskType::ConfigureService => handlers::handle_configure_service(&self.ctx, task).await,
            TaskType::InstallService => handlers::handle_install_service(&self.ctx, task).await,
            TaskType::UninstallService => handlers::handle_uninstall_service(&self.ctx, task).await,
            TaskType::UpgradeAppliance => handlers::handle_upgrade_appliance(&self.ctx, task).await,
            TaskType::Unknown(raw) => return Err(TaskError::UnknownType(raw.clone())),
        };

        Ok(result?)
    }

    /// Deliver a report; failures are logged and otherwise dropped
    async fn send_report(&self, report: TaskReport) {
        match self.reporter.report(&report).await {
            Ok(()) => debug!(
                "[EXECUTOR] Reported {} as {}",
                report.task_id, report.task_status
            ),
            Err(e) => error!(
                "[EXECUTOR] Failed to report {} ({}): {}",
                report.task_id, report.task_status, e
            ),
        }
    }
}

#[async_trait]
impl LaneExecutor for TaskExecutor {
    async fn execute(&self, lane: Lane, task: Task) -> Result<TaskOutcome, TaskError> {
        let start_time = Instant::now();
        info!("[EXECUTOR] Executing {} ({}) on {} lane", task.id, task.kind, lane);

        let result = self.dispatch(lane, &task).await;
        let processing_time = start_time.elapsed();

        // Convert result to report
        match &result {
            Ok(TaskOutcome::Completed(value)) => {
                info!("[EXECUTOR] {} completed in {:?}", task.id, processing_time);
                self.send_report(TaskReport::success(&task.id, value.clone())).await;
            }
            Ok(TaskOutcome::Ignored) => {
                self.send_report(TaskReport::ignored(&task.id)).await;
            }
            Ok(TaskOutcome::Unreported) => {
                debug!("[EXECUTOR] {} finished, nothing to report", task.id);
            }
            Err(TaskError::Handler(e)) => {
                warn!("[EXECUTOR] {} failed after {:?}: {}", task.id, processing_time, e);
                self.send_report(TaskReport::failed(&task.id, e.to_string())).await;
            }
            // Dropped without a report
            Err(TaskError::UnknownType(_)) => {}
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::test_support::{context, task, RecordingReporter};
    use appliance_shared::TaskStatus;
    use serde_json::json;

    fn executor() -> (TaskExecutor, HandlerContext, Arc<RecordingReporter>) {
        let ctx = context();
        let reporter = Arc::new(RecordingReporter::default());
        (TaskExecutor::new(ctx.clone(), reporter.clone()), ctx, reporter)
    }

    #[tokio::test]
    async fn test_success_is_reported() {
        let (executor, _, reporter) = executor();

        let outcome = executor.execute(Lane::Heartbeat, task("hb", "heartbeat")).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Completed(json!({"services": {}})));

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].task_id, "hb");
        assert_eq!(reports[0].task_status, TaskStatus::Success);
        assert_eq!(reports[0].task_result, json!({"services": {}}));
    }

    #[tokio::test]
    async fn test_duplicate_lane_never_runs_handler() {
        let (executor, ctx, reporter) = executor();
        let mut t = task("dup1", "installService");
        t.message.service_code = Some("svc1".into());

        let outcome = executor.execute(Lane::Duplicate, t).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Ignored);
        assert!(ctx.registry.get("svc1").await.is_none());

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].task_id, "dup1");
        assert_eq!(reports[0].task_status, TaskStatus::Ignored);
    }

    #[tokio::test]
    async fn test_unknown_type_is_dropped_without_report() {
        let (executor, _, reporter) = executor();

        let err = executor
            .execute(Lane::Common, task("u1", "rebootAppliance"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::UnknownType(ref t) if t == "rebootAppliance"));
        assert!(reporter.reports().is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_is_reported_as_failed() {
        let (executor, _, reporter) = executor();

        let err = executor
            .execute(Lane::Common, task("c1", "configureService"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Handler(HandlerError::MissingField("service_code"))));

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].task_status, TaskStatus::Failed);
        assert!(reports[0].error_message.contains("service_code"));
    }

    #[tokio::test]
    async fn test_mistyped_field_is_reported_as_failed() {
        let (executor, ctx, reporter) = executor();
        let mut t = task("t1", "installService");
        t.message.service_code = Some(json!("svc1"));
        t.message.target_version = Some(json!(1.0));

        executor.execute(Lane::Common, t).await.unwrap_err();
        assert!(ctx.registry.get("svc1").await.is_none());

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].task_id, "t1");
        assert_eq!(reports[0].task_status, TaskStatus::Failed);
        assert!(reports[0].error_message.contains("target_version"));
    }

    #[tokio::test]
    async fn test_upgrade_is_not_reported() {
        let (executor, _, reporter) = executor();

        let outcome = executor
            .execute(Lane::Common, task("up1", "upgradeAppliance"))
            .await
            .unwrap();
        assert_eq!(outcome, TaskOutcome::Unreported);
        assert!(reporter.reports().is_empty());
    }

    #[tokio::test]
    async fn test_report_failure_does_not_fail_task() {
        let ctx = context();
        let reporter = Arc::new(RecordingReporter::failing());
        let executor = TaskExecutor::new(ctx.clone(), reporter.clone());

        let mut t = task("t1", "installService");
        t.message.service_code = Some("svc1".into());
        let outcome = executor.execute(Lane::Common, t).await.unwrap();

        assert!(matches!(outcome, TaskOutcome::Completed(_)));
        assert!(ctx.registry.get("svc1").await.is_some());
        // Attempted exactly once, never retried
        assert_eq!(reporter.reports().len(), 1);
    }

    #[tokio::test]
    async fn test_collect_reports_metrics() {
        let (executor, _, reporter) = executor();

        executor
            .execute(Lane::Collect, task("m1", "collectApplianceMetrics"))
            .await
            .unwrap();

        let reports = reporter.reports();
        assert_eq!(reports[0].task_result["cpuModel"], "Test CPU");
        assert_eq!(reports[0].task_result["storage"]["available"], 600);
    }
}
