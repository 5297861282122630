//! Fakes and fixtures shared by the task pipeline tests

use super::handlers::HandlerContext;
use super::lanes::Task;
use crate::metrics::{
    ApplianceMetrics, CpuMetrics, MemoryMetrics, MetricsError, MetricsSource, StorageMetrics,
};
use crate::report::{ReportError, Reporter};
use crate::service::ServiceRegistry;
use appliance_shared::{TaskMessage, TaskReport};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Metrics source returning a fixed snapshot
pub struct StaticMetrics;

#[async_trait]
impl MetricsSource for StaticMetrics {
    async fn sample(&self) -> Result<ApplianceMetrics, MetricsError> {
        Ok(ApplianceMetrics {
            record_time: 1_700_000_000,
            hostname: "test-host".into(),
            ipv4: "10.0.0.5".into(),
            cpu: CpuMetrics { total: 2, usage: 5.0 },
            memory: MemoryMetrics { usage: 512, total: 2048 },
            storage: StorageMetrics { total: 1000, available: 600 },
            cpu_model: "Test CPU".into(),
        })
    }
}

/// Metrics source that always fails
pub struct FailingMetrics;

#[async_trait]
impl MetricsSource for FailingMetrics {
    async fn sample(&self) -> Result<ApplianceMetrics, MetricsError> {
        Err(MetricsError::Sampling("sensor offline".into()))
    }
}

/// Reporter that records every report it is given
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<TaskReport>>,
    fail: bool,
}

impl RecordingReporter {
    /// A reporter whose deliveries are recorded but always fail
    pub fn failing() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn reports(&self) -> Vec<TaskReport> {
        self.reports.lock().clone()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn report(&self, report: &TaskReport) -> Result<(), ReportError> {
        self.reports.lock().push(report.clone());
        if self.fail {
            return Err(ReportError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(())
    }
}

pub fn context() -> HandlerContext {
    context_with_metrics(Arc::new(StaticMetrics))
}

pub fn context_with_metrics(metrics: Arc<dyn MetricsSource>) -> HandlerContext {
    HandlerContext {
        registry: Arc::new(ServiceRegistry::new()),
        metrics,
    }
}

/// Build an admitted task; panics on an empty id
pub fn task(id: &str, kind: &str) -> Task {
    Task::from_message(TaskMessage::new(id, kind)).expect("test task needs an id")
}
