//! AMQP 0-9-1 (RabbitMQ) broker implementation

use super::traits::{BrokerConnector, BrokerError, BrokerSession, Delivery, Topology};
use crate::config::BrokerConfig;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicQosOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer, ExchangeKind};
use tracing::debug;

/// Unacknowledged deliveries the broker may push ahead of the agent
const PREFETCH_COUNT: u16 = 32;

const CONSUMER_TAG: &str = "appliance-agent";

/// Connects to RabbitMQ with plain credentials
pub struct AmqpConnector {
    uri: String,
}

impl AmqpConnector {
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            uri: amqp_uri(config),
        }
    }
}

/// Credentials are percent-encoded; the vhost is the default `/`
fn amqp_uri(config: &BrokerConfig) -> String {
    format!(
        "amqp://{}:{}@{}:{}/%2f",
        urlencoding::encode(&config.username),
        urlencoding::encode(&config.password),
        config.host,
        config.port
    )
}

/// Session over one AMQP connection and channel
pub struct AmqpSession {
    connection: Connection,
    channel: Channel,
    consumer: Option<Consumer>,
}

#[async_trait]
impl BrokerConnector for AmqpConnector {
    type Session = AmqpSession;

    async fn connect(&self) -> Result<Self::Session, BrokerError> {
        let connection = Connection::connect(&self.uri, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        Ok(AmqpSession {
            connection,
            channel,
            consumer: None,
        })
    }

    fn name(&self) -> &'static str {
        "RabbitMQ"
    }
}

#[async_trait]
impl BrokerSession for AmqpSession {
    async fn declare(&mut self, topology: &Topology) -> Result<(), BrokerError> {
        self.channel
            .exchange_declare(
                &topology.exchange,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        self.channel
            .queue_declare(
                &topology.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        self.channel
            .queue_bind(
                &topology.queue,
                &topology.exchange,
                &topology.routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        Ok(())
    }

    async fn consume(&mut self, queue: &str) -> Result<(), BrokerError> {
        self.channel
            .basic_qos(PREFETCH_COUNT, BasicQosOptions::default())
            .await?;

        let consumer = self
            .channel
            .basic_consume(
                queue,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        self.consumer = Some(consumer);
        Ok(())
    }

    async fn next_delivery(&mut self) -> Result<Delivery, BrokerError> {
        let consumer = self.consumer.as_mut().ok_or(BrokerError::NotConsuming)?;
        match consumer.next().await {
            Some(Ok(delivery)) => Ok(Delivery {
                tag: delivery.delivery_tag,
                payload: Bytes::from(delivery.data),
            }),
            Some(Err(e)) => Err(e.into()),
            None => Err(BrokerError::Closed("consumer stream ended".into())),
        }
    }

    async fn ack(&mut self, tag: u64) -> Result<(), BrokerError> {
        self.channel
            .basic_ack(tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    async fn close(&mut self) {
        self.consumer = None;
        if let Err(e) = self.connection.close(200, "agent reconnecting").await {
            debug!("[BROKER] Close on stale connection: {}", e);
        }
    }
}
