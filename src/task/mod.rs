//! Task pipeline for the appliance agent
//!
//! This module handles:
//! - Admission control and duplicate suppression for inbound tasks
//! - Routing tasks onto the heartbeat, collect, common and duplicate lanes
//! - One worker per lane dispatching to the task handlers
//! - Reporting task outcomes back to the backend

mod dedup;
mod executor;
pub mod handlers;
pub mod lanes;
mod router;
mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use dedup::DedupCache;
pub use executor::TaskExecutor;
pub use lanes::Task;
pub use router::{RouteError, RouteOutcome, TaskRouter};
pub use worker::WorkerPool;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Reporter;
    use crate::task::lanes::Lane;
    use crate::task::test_support::{context, RecordingReporter};
    use appliance_shared::{TaskReport, TaskStatus};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    async fn wait_for_reports(reporter: &RecordingReporter, count: usize) -> Vec<TaskReport> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let reports = reporter.reports();
                if reports.len() >= count {
                    return reports;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("reports did not arrive in time")
    }

    #[tokio::test]
    async fn test_pipeline_install_duplicate_configure_then_heartbeat() {
        let ctx = context();
        let reporter = Arc::new(RecordingReporter::default());
        let sink: Arc<dyn Reporter> = reporter.clone();
        let executor = Arc::new(TaskExecutor::new(ctx.clone(), sink));

        let (senders, receivers) = lanes::channels();
        let pool = WorkerPool::spawn(receivers, executor);
        let router = TaskRouter::new(Arc::new(DedupCache::new(Duration::from_secs(60))), senders);

        let install = br#"{"task_id":"t1","task_type":"installService","service_code":"svc1","target_version":"1.0"}"#;
        let configure = br#"{"task_id":"dup1","task_type":"configureService","service_code":"svc1","body":{"a":1}}"#;
        let heartbeat = br#"{"task_id":"t2","task_type":"heartbeat"}"#;

        assert_eq!(router.route(install).unwrap(), RouteOutcome::Enqueued(Lane::Common));
        assert_eq!(router.route(configure).unwrap(), RouteOutcome::Enqueued(Lane::Common));
        wait_for_reports(&reporter, 2).await;

        assert_eq!(router.route(configure).unwrap(), RouteOutcome::Enqueued(Lane::Duplicate));
        wait_for_reports(&reporter, 3).await;

        assert_eq!(router.route(heartbeat).unwrap(), RouteOutcome::Enqueued(Lane::Heartbeat));
        let reports = wait_for_reports(&reporter, 4).await;

        let summary: Vec<(&str, TaskStatus)> = reports
            .iter()
            .map(|r| (r.task_id.as_str(), r.task_status))
            .collect();
        assert_eq!(
            summary,
            [
                ("t1", TaskStatus::Success),
                ("dup1", TaskStatus::Success),
                ("dup1", TaskStatus::Ignored),
                ("t2", TaskStatus::Success),
            ]
        );

        // The redelivered configure never ran
        assert_eq!(reports[2].task_result, Value::Null);
        let record = ctx.registry.get("svc1").await.unwrap();
        assert_eq!(record.settings.map(Value::Object), Some(json!({"a": 1})));

        let svc1 = &reports[3].task_result["services"]["svc1"];
        assert_eq!(svc1["status"], "Running");
        assert_eq!(svc1["version"], "1.0");

        drop(router);
        pool.join().await;
    }
}
