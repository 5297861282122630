//! Host configuration
//!
//! The agent reads its identity, broker credentials and backend endpoint once
//! at startup. The resulting [`HostConfig`] is an immutable snapshot shared
//! behind an `Arc`; it is never refreshed while the process runs.

use appliance_shared::defaults;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while assembling the host configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Broker connection settings
#[derive(Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Direct exchange the task queue is bound to
    pub exchange: String,
    /// Queue name prefix, see [`BrokerConfig::queue_name`]
    pub queue_prefix: String,
    /// Fixed delay between reconnect attempts
    pub retry_interval: Duration,
}

impl BrokerConfig {
    /// Queue (and routing key) for the given appliance
    pub fn queue_name(&self, appliance_id: &str) -> String {
        defaults::queue_name(&self.queue_prefix, appliance_id)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: defaults::BROKER_PORT,
            username: "guest".into(),
            password: "guest".into(),
            exchange: defaults::EXCHANGE_NAME.into(),
            queue_prefix: defaults::QUEUE_PREFIX.into(),
            retry_interval: Duration::from_secs(defaults::BROKER_RETRY_INTERVAL_SECS),
        }
    }
}

// Credentials stay out of logs
impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("exchange", &self.exchange)
            .field("queue_prefix", &self.queue_prefix)
            .field("retry_interval", &self.retry_interval)
            .finish()
    }
}

/// Backend callback settings
#[derive(Clone)]
pub struct BackendConfig {
    pub host: String,
    /// `https` in production; `http` is accepted for local test backends
    pub scheme: String,
    /// Bearer token for the callback
    pub token: String,
    pub timeout: Duration,
}

impl BackendConfig {
    /// Base URL of the backend, e.g. `https://backend.example.com`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("host", &self.host)
            .field("scheme", &self.scheme)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Immutable snapshot of the appliance's host configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub appliance_id: String,
    pub broker: BrokerConfig,
    pub backend: BackendConfig,
    /// Window during which a task id is treated as already seen
    pub dedup_ttl: Duration,
}

impl HostConfig {
    /// Load from the process environment (call `dotenvy::dotenv()` first to
    /// pick up a `.env` file)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let broker_defaults = BrokerConfig::default();
        let broker = BrokerConfig {
            host: get("BROKER_HOST").unwrap_or(broker_defaults.host),
            port: parse_or("BROKER_PORT", get("BROKER_PORT"), broker_defaults.port)?,
            username: get("BROKER_USERNAME").unwrap_or(broker_defaults.username),
            password: get("BROKER_PASSWORD").unwrap_or(broker_defaults.password),
            exchange: get("BROKER_EXCHANGE").unwrap_or(broker_defaults.exchange),
            queue_prefix: get("BROKER_QUEUE_PREFIX").unwrap_or(broker_defaults.queue_prefix),
            retry_interval: secs_or(
                "BROKER_RETRY_SECS",
                get("BROKER_RETRY_SECS"),
                defaults::BROKER_RETRY_INTERVAL_SECS,
            )?,
        };

        let scheme = get("BACKEND_SCHEME").unwrap_or_else(|| "https".into());
        if scheme != "https" && scheme != "http" {
            return Err(ConfigError::Invalid {
                key: "BACKEND_SCHEME",
                value: scheme,
            });
        }

        let backend = BackendConfig {
            host: required("BACKEND_HOST")?,
            scheme,
            token: required("BACKEND_TOKEN")?,
            timeout: secs_or(
                "BACKEND_TIMEOUT_SECS",
                get("BACKEND_TIMEOUT_SECS"),
                defaults::CALLBACK_TIMEOUT_SECS,
            )?,
        };

        Ok(Self {
            appliance_id: required("APPLIANCE_ID")?,
            broker,
            backend,
            dedup_ttl: secs_or(
                "DEDUP_TTL_SECS",
                get("DEDUP_TTL_SECS"),
                defaults::DEDUP_TTL_SECS,
            )?,
        })
    }

    /// Queue (and routing key) this appliance consumes from
    pub fn queue_name(&self) -> String {
        self.broker.queue_name(&self.appliance_id)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// A whole number of seconds; zero is rejected
fn secs_or(key: &'static str, raw: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    match parse_or(key, raw, default)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: "0".into(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}
