//! Host metrics collection
//!
//! Samples CPU, memory, storage and host identity for the
//! `collectApplianceMetrics` task.

mod system;

pub use system::SysinfoMetrics;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while sampling the host
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("metrics sampling failed: {0}")]
    Sampling(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuMetrics {
    /// Logical core count
    pub total: usize,
    /// Global usage percentage
    pub usage: f32,
}

/// Memory in bytes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryMetrics {
    pub usage: u64,
    pub total: u64,
}

/// Storage in bytes, summed over all mounted disks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageMetrics {
    pub total: u64,
    pub available: u64,
}

/// One snapshot reported as the result of a collect task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceMetrics {
    /// Unix timestamp (seconds) of the sample
    pub record_time: i64,
    pub hostname: String,
    pub ipv4: String,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub storage: StorageMetrics,
    pub cpu_model: String,
}

/// Source of host metric snapshots
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn sample(&self) -> Result<ApplianceMetrics, MetricsError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metrics_wire_shape() {
        let metrics = ApplianceMetrics {
            record_time: 1_700_000_000,
            hostname: "va-01".into(),
            ipv4: "10.0.0.5".into(),
            cpu: CpuMetrics { total: 4, usage: 12.5 },
            memory: MemoryMetrics { usage: 1024, total: 4096 },
            storage: StorageMetrics { total: 100, available: 40 },
            cpu_model: "Test CPU".into(),
        };

        assert_eq!(
            serde_json::to_value(&metrics).unwrap(),
            json!({
                "recordTime": 1_700_000_000,
                "hostname": "va-01",
                "ipv4": "10.0.0.5",
                "cpu": {"total": 4, "usage": 12.5},
                "memory": {"usage": 1024, "total": 4096},
                "storage": {"total": 100, "available": 40},
                "cpuModel": "Test CPU"
            })
        );
    }
}
