//! Broker consumer with persistent subscription and automatic reconnection

use super::traits::{BrokerConnector, BrokerError, BrokerSession, Delivery, Topology};
use crate::task::{RouteError, RouteOutcome, TaskRouter};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the broker consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    /// Topology declared and consuming
    Connected { broker: &'static str, queue: String },
    /// An established session was lost
    Disconnected { reason: String },
    /// A connection attempt failed
    ConnectionFailed { attempt: u32, reason: String },
}

/// Why a session stopped without a broker error
enum SessionEnd {
    LanesClosed,
}

/// Consumes the appliance queue and feeds the task router
pub struct BrokerConsumer<C: BrokerConnector> {
    connector: C,
    topology: Topology,
    router: TaskRouter,
    retry_interval: Duration,
    event_tx: mpsc::Sender<BrokerEvent>,
}

impl<C: BrokerConnector> BrokerConsumer<C> {
    /// Create a consumer and the channel its events are published on
    pub fn new(
        connector: C,
        topology: Topology,
        router: TaskRouter,
        retry_interval: Duration,
    ) -> (Self, mpsc::Receiver<BrokerEvent>) {
        let (event_tx, event_rx) = mpsc::channel::<BrokerEvent>(100);
        let consumer = Self {
            connector,
            topology,
            router,
            retry_interval,
            event_tx,
        };
        (consumer, event_rx)
    }

    /// Connect, consume and reconnect on any broker failure.
    ///
    /// Only returns once the task lanes are closed.
    pub async fn run(self) {
        let broker = self.connector.name();
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            info!("[BROKER] Connecting to {} (attempt {})", broker, attempt);

            match self.connector.connect().await {
                Ok(mut session) => {
                    attempt = 0;
                    let result = self.serve(&mut session).await;
                    session.close().await;

                    match result {
                        Ok(SessionEnd::LanesClosed) => {
                            error!("[BROKER] Task lanes closed, consumer stopping");
                            return;
                        }
                        Err(e) => {
                            warn!("[BROKER] Disconnected from {}: {}", broker, e);
                            self.emit(BrokerEvent::Disconnected {
                                reason: e.to_string(),
                            })
                            .await;
                        }
                    }
                }
                Err(e) => {
                    warn!("[BROKER] Connection attempt {} failed: {}", attempt, e);
                    self.emit(BrokerEvent::ConnectionFailed {
                        attempt,
                        reason: e.to_string(),
                    })
                    .await;
                }
            }

            info!("[BROKER] Retrying in {:?}", self.retry_interval);
            tokio::time::sleep(self.retry_interval).await;
        }
    }

    /// Declare, subscribe and pump deliveries until the session fails
    async fn serve(&self, session: &mut C::Session) -> Result<SessionEnd, BrokerError> {
        session.declare(&self.topology).await?;
        session.consume(&self.topology.queue).await?;

        info!(
            "[BROKER] Consuming {} (exchange {})",
            self.topology.queue, self.topology.exchange
        );
        self.emit(BrokerEvent::Connected {
            broker: self.connector.name(),
            queue: self.topology.queue.clone(),
        })
        .await;

        loop {
            let delivery = session.next_delivery().await?;
            if !self.handle_delivery(&delivery) {
                return Ok(SessionEnd::LanesClosed);
            }
            // Acked only once the task is on a lane (or deliberately discarded)
            session.ack(delivery.tag).await?;
        }
    }

    /// Route one delivery; false when the lanes are gone
    fn handle_delivery(&self, delivery: &Delivery) -> bool {
        match self.router.route(&delivery.payload) {
            Ok(RouteOutcome::Enqueued(lane)) => {
                debug!("[BROKER] Delivery {} -> {} lane", delivery.tag, lane);
                true
            }
            Ok(RouteOutcome::Dropped(reason)) => {
                warn!("[BROKER] Discarding delivery {}: {:?}", delivery.tag, reason);
                true
            }
            Err(RouteError::Malformed(e)) => {
                warn!("[BROKER] Discarding malformed delivery {}: {}", delivery.tag, e);
                true
            }
            Err(RouteError::LaneClosed(e)) => {
                error!("[BROKER] Cannot enqueue delivery {}: {}", delivery.tag, e);
                false
            }
        }
    }

    async fn emit(&self, event: BrokerEvent) {
        let _ = self.event_tx.send(event).await;
    }
}
