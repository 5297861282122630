//! `sysinfo`-backed metrics source

use super::{ApplianceMetrics, CpuMetrics, MemoryMetrics, MetricsError, MetricsSource, StorageMetrics};
use async_trait::async_trait;
use std::net::IpAddr;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};
use tokio::sync::Mutex;

/// Samples the local host
pub struct SysinfoMetrics {
    system: Mutex<System>,
}

impl SysinfoMetrics {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_with_specifics(
                RefreshKind::nothing()
                    .with_cpu(CpuRefreshKind::everything())
                    .with_memory(MemoryRefreshKind::everything()),
            )),
        }
    }
}

impl Default for SysinfoMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsSource for SysinfoMetrics {
    async fn sample(&self) -> Result<ApplianceMetrics, MetricsError> {
        let mut system = self.system.lock().await;

        // CPU usage is a delta between two refreshes
        system.refresh_cpu_all();
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        system.refresh_cpu_all();
        system.refresh_memory();

        let cpus = system.cpus();
        if cpus.is_empty() {
            return Err(MetricsError::Sampling("no CPUs reported".into()));
        }

        let cpu = CpuMetrics {
            total: cpus.len(),
            usage: system.global_cpu_usage(),
        };
        let cpu_model = cpus[0].brand().trim().to_string();
        let memory = MemoryMetrics {
            usage: system.used_memory(),
            total: system.total_memory(),
        };
        drop(system);

        let disks = Disks::new_with_refreshed_list();
        let storage = disks.list().iter().fold(
            StorageMetrics { total: 0, available: 0 },
            |acc, disk| StorageMetrics {
                total: acc.total + disk.total_space(),
                available: acc.available + disk.available_space(),
            },
        );

        Ok(ApplianceMetrics {
            record_time: chrono::Utc::now().timestamp(),
            hostname: System::host_name().unwrap_or_default(),
            ipv4: primary_ipv4(),
            cpu,
            memory,
            storage,
            cpu_model,
        })
    }
}

/// First non-loopback IPv4 address, falling back to 127.0.0.1
fn primary_ipv4() -> String {
    let networks = Networks::new_with_refreshed_list();
    networks
        .values()
        .flat_map(|data| data.ip_networks().iter().map(|net| net.addr))
        .find(|addr| matches!(addr, IpAddr::V4(v4) if !v4.is_loopback()))
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "127.0.0.1".into())
}
