//! Task handlers for different task types

mod collect;
mod duplicate;
mod heartbeat;
mod service;
mod upgrade;

pub use collect::handle_collect_metrics;
pub use duplicate::handle_duplicate;
pub use heartbeat::handle_heartbeat;
pub use service::{handle_configure_service, handle_install_service, handle_uninstall_service};
pub use upgrade::handle_upgrade_appliance;

use crate::metrics::{MetricsError, MetricsSource};
use appliance_shared::NotAString;
use crate::service::ServiceRegistry;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Context passed to task handlers
#[derive(Clone)]
pub struct HandlerContext {
    pub registry: Arc<ServiceRegistry>,
    pub metrics: Arc<dyn MetricsSource>,
}

/// Result of a handler that ran to completion
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Report success with this result payload
    Completed(Value),
    /// Duplicate delivery; report it as ignored
    Ignored,
    /// Nothing is reported back
    Unreported,
}

/// Errors raised by task handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("field {field} must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("result encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<NotAString> for HandlerError {
    fn from(err: NotAString) -> Self {
        HandlerError::InvalidField {
            field: err.0,
            expected: "a string",
        }
    }
}
