//! Inbound task messages delivered through the broker

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Task type carried in the `task_type` field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskType {
    Heartbeat,
    CollectApplianceMetrics,
    ConfigureService,
    InstallService,
    UninstallService,
    UpgradeAppliance,
    /// Anything else, kept verbatim for logging
    Unknown(String),
}

impl TaskType {
    /// Wire name of this task type
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::Heartbeat => "heartbeat",
            TaskType::CollectApplianceMetrics => "collectApplianceMetrics",
            TaskType::ConfigureService => "configureService",
            TaskType::InstallService => "installService",
            TaskType::UninstallService => "uninstallService",
            TaskType::UpgradeAppliance => "upgradeAppliance",
            TaskType::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for TaskType {
    fn from(value: &str) -> Self {
        match value {
            "heartbeat" => TaskType::Heartbeat,
            "collectApplianceMetrics" => TaskType::CollectApplianceMetrics,
            "configureService" => TaskType::ConfigureService,
            "installService" => TaskType::InstallService,
            "uninstallService" => TaskType::UninstallService,
            "upgradeAppliance" => TaskType::UpgradeAppliance,
            other => TaskType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload field that is present but not a string
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("field {0} must be a string")]
pub struct NotAString(pub &'static str);

/// A task message as published by the backend.
///
/// Every field is optional on the wire. `task_id` and `task_type` are decoded
/// strictly; the type-specific fields are kept as raw JSON and checked by the
/// typed accessors, so a bad field fails the task instead of the delivery.
/// Older backend revisions use camelCase keys, which are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    #[serde(default, alias = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(default, alias = "taskType", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,

    #[serde(default, alias = "serviceCode", skip_serializing_if = "Option::is_none")]
    pub service_code: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(default, alias = "targetVersion", skip_serializing_if = "Option::is_none")]
    pub target_version: Option<Value>,

    #[serde(default, alias = "imagePath", skip_serializing_if = "Option::is_none")]
    pub image_path: Option<Value>,

    #[serde(default, alias = "imageSha256", skip_serializing_if = "Option::is_none")]
    pub image_sha256: Option<Value>,
}

impl TaskMessage {
    /// Create a message with the given id and type and no payload fields
    pub fn new(task_id: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            task_type: Some(task_type.into()),
            ..Default::default()
        }
    }

    /// The task id, if present and non-empty
    pub fn id(&self) -> Option<&str> {
        self.task_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Classify the task type; a missing type is `Unknown("")`
    pub fn kind(&self) -> TaskType {
        TaskType::from(self.task_type.as_deref().unwrap_or_default())
    }

    /// The `body` field when it is a JSON object
    pub fn body_object(&self) -> Option<&Map<String, Value>> {
        self.body.as_ref().and_then(Value::as_object)
    }

    pub fn service_code(&self) -> Result<Option<&str>, NotAString> {
        text(&self.service_code, "service_code")
    }

    pub fn target_version(&self) -> Result<Option<&str>, NotAString> {
        text(&self.target_version, "target_version")
    }

    pub fn image_path(&self) -> Result<Option<&str>, NotAString> {
        text(&self.image_path, "image_path")
    }

    pub fn image_sha256(&self) -> Result<Option<&str>, NotAString> {
        text(&self.image_sha256, "image_sha256")
    }
}

/// Absent and `null` read as `None`; any other non-string is an error
fn text<'a>(value: &'a Option<Value>, field: &'static str) -> Result<Option<&'a str>, NotAString> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(NotAString(field)),
    }
}
