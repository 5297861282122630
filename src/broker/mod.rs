//! Broker module - consumes the appliance task queue
//!
//! This module handles:
//! - Connecting to the message broker and declaring the exchange/queue binding
//! - Forwarding each delivery to the task router, acking after enqueue
//! - Reconnecting at a fixed interval whenever the connection is lost

mod amqp;
mod consumer;
mod traits;

pub use amqp::AmqpConnector;
pub use consumer::{BrokerConsumer, BrokerEvent};
pub use traits::Topology;
