//! Task result reporting
//!
//! This module handles:
//! - The [`Reporter`] abstraction the workers report through
//! - Delivery of reports to the backend callback over HTTPS
//!
//! Delivery is best-effort: a failed report is logged by the caller and
//! never retried or requeued.

mod http;

pub use http::HttpReporter;

use appliance_shared::TaskReport;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while delivering a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("callback request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("callback rejected with HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Sink for task outcomes
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Deliver one report
    async fn report(&self, report: &TaskReport) -> Result<(), ReportError>;
}
