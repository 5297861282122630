//! HTTP callback reporter

use super::{ReportError, Reporter};
use crate::config::BackendConfig;
use appliance_shared::{defaults, TaskReport};
use async_trait::async_trait;
use tracing::debug;

/// Posts reports to `<backend>/va/<appliance_id>/task/` with a bearer token
pub struct HttpReporter {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl HttpReporter {
    /// Build a reporter for the given backend and appliance.
    ///
    /// Certificate verification is left on.
    pub fn new(backend: &BackendConfig, appliance_id: &str) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(backend.timeout)
            .build()?;

        Ok(Self {
            client,
            url: callback_url(backend, appliance_id),
            token: backend.token.clone(),
        })
    }

    /// Full callback URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn callback_url(backend: &BackendConfig, appliance_id: &str) -> String {
    format!("{}{}", backend.base_url(), defaults::callback_path(appliance_id))
}

#[async_trait]
impl Reporter for HttpReporter {
    async fn report(&self, report: &TaskReport) -> Result<(), ReportError> {
        debug!(
            "[REPORT] POST {} task={} status={}",
            self.url, report.task_id, report.task_status
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(report)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status(status));
        }

        Ok(())
    }
}
