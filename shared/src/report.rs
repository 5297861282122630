//! Task reports posted back to the backend callback

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Final status of a task as seen by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    /// Duplicate delivery; nothing was executed
    Ignored,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Ignored => write!(f, "ignored"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Callback body: `{task_id, task_status, error_message, task_result}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub task_id: String,
    pub task_status: TaskStatus,
    pub error_message: String,
    pub task_result: Value,
}

impl TaskReport {
    /// Report a completed task with its result payload
    pub fn success(task_id: impl Into<String>, task_result: Value) -> Self {
        Self {
            task_id: task_id.into(),
            task_status: TaskStatus::Success,
            error_message: "success".into(),
            task_result,
        }
    }

    /// Report a task that was rejected as a duplicate
    pub fn ignored(task_id: impl Into<String>) -> Self {
        let task_id = task_id.into();
        Self {
            error_message: format!("task {} already received", task_id),
            task_id,
            task_status: TaskStatus::Ignored,
            task_result: Value::Null,
        }
    }

    /// Report a task whose handler failed
    pub fn failed(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            task_status: TaskStatus::Failed,
            error_message: message.into(),
            task_result: Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_report_shape() {
        let report = TaskReport::success("t1", json!({"ok": true}));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "task_id": "t1",
                "task_status": "success",
                "error_message": "success",
                "task_result": {"ok": true}
            })
        );
    }

    #[test]
    fn test_ignored_report() {
        let report = TaskReport::ignored("dup1");
        assert_eq!(report.task_id, "dup1");
        assert_eq!(report.task_status, TaskStatus::Ignored);
        assert!(report.error_message.contains("dup1"));
        assert_eq!(report.task_result, Value::Null);
    }

    #[test]
    fn test_failed_report() {
        let report = TaskReport::failed("t9", "missing service_code");
        assert_eq!(report.task_status.to_string(), "failed");
        assert_eq!(report.error_message, "missing service_code");
    }
}
