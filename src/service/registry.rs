//! In-memory registry of installed services and their settings

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Runtime status of an installed service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceStatus {
    Running,
}

/// Per-service key/value settings, shallow-merged by configuration tasks
pub type ServiceSettings = Map<String, Value>;

/// State recorded for one `service_code`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_sha256: Option<String>,
    /// `None` for a service that was configured but never installed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<ServiceSettings>,
}

/// Fields applied by an install task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceInstall {
    pub version: Option<String>,
    pub image_path: Option<String>,
    pub image_sha256: Option<String>,
}

/// Registry of service records, guarded by a single internal lock.
///
/// Written by the common lane and read by the heartbeat lane; callers only
/// ever see clones.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, ServiceRecord>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of one record
    pub async fn get(&self, service_code: &str) -> Option<ServiceRecord> {
        self.services.read().await.get(service_code).cloned()
    }

    /// Create or update a record from an install task; settings are preserved
    pub async fn upsert(&self, service_code: &str, install: ServiceInstall) -> ServiceRecord {
        let mut services = self.services.write().await;
        let record = services.entry(service_code.to_string()).or_default();
        record.version = install.version;
        record.image_path = install.image_path;
        record.image_sha256 = install.image_sha256;
        record.status = Some(ServiceStatus::Running);
        record.clone()
    }

    /// Shallow-merge `settings` into the record, creating it if needed.
    ///
    /// New keys are added, existing keys overwritten, omitted keys kept.
    pub async fn merge(&self, service_code: &str, settings: &ServiceSettings) -> ServiceSettings {
        let mut services = self.services.write().await;
        let record = services.entry(service_code.to_string()).or_default();
        let current = record.settings.get_or_insert_with(Map::new);
        for (key, value) in settings {
            current.insert(key.clone(), value.clone());
        }
        current.clone()
    }

    /// Remove a record, returning it if it existed
    pub async fn remove(&self, service_code: &str) -> Option<ServiceRecord> {
        self.services.write().await.remove(service_code)
    }

    /// Copy of every record, ordered by service code
    pub async fn snapshot(&self) -> BTreeMap<String, ServiceRecord> {
        self.services
            .read()
            .await
            .iter()
            .map(|(code, record)| (code.clone(), record.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.services.read().await.len()
    }
}
