//! Appliance Shared Protocol Types
//!
//! This crate provides the task message and report types exchanged between
//! the backend (via the broker and the HTTP callback) and the appliance agent,
//! together with the JSON codec used on the broker side.

pub mod codec;
pub mod message;
pub mod report;

// Re-export commonly used types at crate root
pub use message::{NotAString, TaskMessage, TaskType};
pub use report::{TaskReport, TaskStatus};

/// Fixed protocol parameters shared with the backend
pub mod defaults {
    /// Broker exchange all appliance task queues are bound to
    pub const EXCHANGE_NAME: &str = "va_task";

    /// Queue name prefix; the full name is `<prefix>_<appliance_id>`
    pub const QUEUE_PREFIX: &str = "va_task";

    /// Default AMQP port
    pub const BROKER_PORT: u16 = 5672;

    /// Delay between broker reconnect attempts
    pub const BROKER_RETRY_INTERVAL_SECS: u64 = 5;

    /// How long an admitted task id is remembered for duplicate suppression
    pub const DEDUP_TTL_SECS: u64 = 60;

    /// Timeout for a single callback request to the backend
    pub const CALLBACK_TIMEOUT_SECS: u64 = 30;

    /// Callback path for task results, templated with the appliance id
    pub fn callback_path(appliance_id: &str) -> String {
        format!("/va/{}/task/", appliance_id)
    }

    /// Queue (and routing key) for a given appliance
    pub fn queue_name(prefix: &str, appliance_id: &str) -> String {
        format!("{}_{}", prefix, appliance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_name_derivation() {
        assert_eq!(
            defaults::queue_name(defaults::QUEUE_PREFIX, "974bf535"),
            "va_task_974bf535"
        );
    }

    #[test]
    fn test_callback_path() {
        assert_eq!(defaults::callback_path("abc"), "/va/abc/task/");
    }
}
