mod broker;
mod config;
mod metrics;
mod report;
mod service;
mod task;

use anyhow::{bail, Context, Result};
use broker::{AmqpConnector, BrokerConsumer, BrokerEvent, Topology};
use config::HostConfig;
use metrics::SysinfoMetrics;
use report::HttpReporter;
use service::ServiceRegistry;
use std::sync::Arc;
use task::handlers::HandlerContext;
use task::{lanes, DedupCache, TaskExecutor, TaskRouter, WorkerPool};

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();

    // A missing .env file is fine; the process environment still applies
    dotenvy::dotenv().ok();
    let config = HostConfig::from_env().context("loading host configuration")?;

    info!("Appliance agent starting: {}", config.appliance_id);
    info!("  Broker: {}:{}", config.broker.host, config.broker.port);
    info!("  Queue: {}", config.queue_name());
    info!("  Backend: {}", config.backend.base_url());

    // Task execution side
    let reporter = Arc::new(
        HttpReporter::new(&config.backend, &config.appliance_id)
            .context("building callback client")?,
    );
    info!("Reporting task results to {}", reporter.url());

    let ctx = HandlerContext {
        registry: Arc::new(ServiceRegistry::new()),
        metrics: Arc::new(SysinfoMetrics::new()),
    };
    let executor = Arc::new(TaskExecutor::new(ctx, reporter));

    let (senders, receivers) = lanes::channels();
    let workers = WorkerPool::spawn(receivers, executor);
    info!("Started {} lane workers", workers.running().len());

    // Intake side
    let router = TaskRouter::new(Arc::new(DedupCache::new(config.dedup_ttl)), senders);
    let topology = Topology::direct(config.broker.exchange.clone(), config.queue_name());
    let (consumer, mut events) = BrokerConsumer::new(
        AmqpConnector::new(&config.broker),
        topology,
        router,
        config.broker.retry_interval,
    );
    tokio::spawn(consumer.run());

    // Main event loop
    loop {
        match events.recv().await {
            Some(BrokerEvent::Connected { broker, queue }) => {
                info!("Connected to {}, consuming {}", broker, queue);
            }
            Some(BrokerEvent::Disconnected { reason }) => {
                warn!("Broker disconnected: {}", reason);
            }
            Some(BrokerEvent::ConnectionFailed { attempt, reason }) => {
                error!("Broker connection attempt {} failed: {}", attempt, reason);
            }
            None => {
                error!("Broker consumer stopped");
                break;
            }
        }
    }

    workers.join().await;
    bail!("broker consumer exited")
}

/// `RUST_LOG` directives when set and valid, INFO otherwise
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
