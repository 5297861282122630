//! Broker abstraction for pluggable message-queue backends

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors raised by a broker connection or channel
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("connection closed: {0}")]
    Closed(String),

    #[error("consume was not started on this session")]
    NotConsuming,
}

/// Exchange, queue and binding the agent consumes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
}

impl Topology {
    /// Direct binding where the routing key equals the queue name
    pub fn direct(exchange: impl Into<String>, queue: impl Into<String>) -> Self {
        let queue = queue.into();
        Self {
            exchange: exchange.into(),
            routing_key: queue.clone(),
            queue,
        }
    }
}

/// One message delivered by the broker
#[derive(Debug, Clone)]
pub struct Delivery {
    pub tag: u64,
    pub payload: Bytes,
}

/// A live broker connection
#[async_trait]
pub trait BrokerSession: Send {
    /// Declare the exchange, queue and binding; safe to repeat
    async fn declare(&mut self, topology: &Topology) -> Result<(), BrokerError>;

    /// Start consuming from `queue`
    async fn consume(&mut self, queue: &str) -> Result<(), BrokerError>;

    /// Wait for the next delivery; an error means the session is unusable
    async fn next_delivery(&mut self) -> Result<Delivery, BrokerError>;

    /// Acknowledge a delivery
    async fn ack(&mut self, tag: u64) -> Result<(), BrokerError>;

    /// Close the connection, ignoring errors from an already dead peer
    async fn close(&mut self);
}

/// Factory for broker sessions
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// The session type this connector produces
    type Session: BrokerSession;

    /// Attempt to connect, returning a session on success
    async fn connect(&self) -> Result<Self::Session, BrokerError>;

    /// Human-readable name for this broker
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_topology() {
        let topology = Topology::direct("va_task", "va_task_abc");
        assert_eq!(topology.exchange, "va_task");
        assert_eq!(topology.queue, "va_task_abc");
        assert_eq!(topology.routing_key, "va_task_abc");
    }
}
