//! Queue abstraction and the broker-backed consume loop

use std::future::Future;
use std::sync::{Arc, Mutex};

use async_channel::{bounded, Receiver, Sender};
use contracts::Message;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::broker::BrokerSource;
use crate::counter::PendingCounter;
use crate::error::{BrokerError, IngestionError, Result};
use crate::metrics::IngestionMetrics;

/// Message intake as seen by the dispatcher and the shutdown coordinator
pub trait Queue: Send + Sync {
    /// Receive side of the message channel
    fn messages(&self) -> Receiver<Message>;

    /// Pull from the broker and publish onto the message channel until stopped.
    ///
    /// Returns `Err` on an unrecoverable broker failure. Either way the
    /// message channel is closed when this returns.
    fn consume_loop(&self) -> impl Future<Output = Result<()>> + Send;

    /// Ask the consume loop to exit after its current read.
    ///
    /// Idempotent; returns true only for the call that performed the stop.
    fn stop_consuming(&self) -> bool;

    /// Shared in-flight counter used for drain synchronization
    fn pending(&self) -> PendingCounter;
}

/// Queue backed by a `BrokerSource`
pub struct BrokerQueue<B> {
    /// Taken by the (single) consume loop
    broker: Mutex<Option<B>>,
    broker_name: String,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    pending: PendingCounter,
    stop_tx: watch::Sender<bool>,
    metrics: Arc<IngestionMetrics>,
}

impl<B: BrokerSource + Send> BrokerQueue<B> {
    /// Create a queue around `broker`
    ///
    /// # Arguments
    /// * `channel_capacity` - Message channel capacity
    pub fn new(broker: B, channel_capacity: usize) -> Self {
        let (tx, rx) = bounded(channel_capacity);
        let (stop_tx, _) = watch::channel(false);

        Self {
            broker_name: broker.name().to_string(),
            broker: Mutex::new(Some(broker)),
            tx,
            rx,
            pending: PendingCounter::new(),
            stop_tx,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    pub fn broker_name(&self) -> &str {
        &self.broker_name
    }

    fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    fn take_broker(&self) -> Result<B> {
        self.broker
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or(IngestionError::AlreadyConsuming)
    }

    async fn consume(&self, broker: &mut B) -> Result<()> {
        while !self.is_stopped() {
            match broker.poll().await {
                Ok(Some(message)) => self.publish(message).await?,
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    self.metrics.record_malformed();
                    warn!(broker = %self.broker_name, error = %e, "Skipping malformed message");
                }
                Err(e) => return Err(self.broker_failure(e)),
            }
        }
        Ok(())
    }

    async fn publish(&self, message: Message) -> Result<()> {
        self.metrics.record_received();
        self.tx
            .send(message)
            .await
            .map_err(|_| IngestionError::ChannelClosed)?;
        self.metrics.record_published();
        self.metrics.update_queue_len(self.tx.len());
        Ok(())
    }

    fn broker_failure(&self, source: BrokerError) -> IngestionError {
        IngestionError::Broker {
            broker: self.broker_name.clone(),
            source,
        }
    }
}

impl<B: BrokerSource + Send> Queue for BrokerQueue<B> {
    fn messages(&self) -> Receiver<Message> {
        self.rx.clone()
    }

    #[instrument(name = "queue_consume_loop", skip(self), fields(broker = %self.broker_name))]
    async fn consume_loop(&self) -> Result<()> {
        let mut broker = self.take_broker()?;
        info!(broker = %self.broker_name, "Consume loop started");

        let result = self.consume(&mut broker).await;
        self.tx.close();

        let snapshot = self.metrics.snapshot();
        match &result {
            Ok(()) => info!(
                received = snapshot.messages_received,
                malformed = snapshot.malformed,
                "Consume loop stopped"
            ),
            Err(e) => error!(
                error = %e,
                received = snapshot.messages_received,
                "Consume loop failed"
            ),
        }
        result
    }

    fn stop_consuming(&self) -> bool {
        let was_stopped = self.stop_tx.send_replace(true);
        if !was_stopped {
            debug!(broker = %self.broker_name, "Stop requested");
        }
        !was_stopped
    }

    fn pending(&self) -> PendingCounter {
        self.pending.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBroker;
    use serde_json::json;
    use std::time::Duration;

    fn message(token: &str) -> Message {
        Message::new(token, "game", json!({}))
    }

    #[tokio::test]
    async fn test_consume_until_stopped() {
        let broker = MockBroker::from_messages(vec![message("a"), message("b")]);
        let queue = Arc::new(BrokerQueue::new(broker, 10));
        let rx = queue.messages();

        let handle = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.consume_loop().await })
        };

        assert_eq!(rx.recv().await.unwrap().token, "a");
        assert_eq!(rx.recv().await.unwrap().token, "b");

        assert!(queue.stop_consuming());
        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("consume loop should exit after stop")
            .unwrap();
        assert!(result.is_ok());

        // Channel closed once the loop has exited
        assert!(rx.recv().await.is_err());
        assert_eq!(queue.metrics().snapshot().messages_published, 2);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let queue = BrokerQueue::new(MockBroker::from_messages(vec![]), 1);
        assert!(queue.stop_consuming());
        assert!(!queue.stop_consuming());
        assert!(!queue.stop_consuming());
    }

    #[tokio::test]
    async fn test_stopped_before_start_exits_immediately() {
        let queue = BrokerQueue::new(MockBroker::from_messages(vec![message("a")]), 1);
        queue.stop_consuming();
        assert!(queue.consume_loop().await.is_ok());
        assert!(queue.messages().recv().await.is_err());
    }

    #[tokio::test]
    async fn test_second_consume_loop_is_refused() {
        let queue = Arc::new(BrokerQueue::new(MockBroker::from_messages(vec![]), 1));
        let spawn_loop = |queue: Arc<BrokerQueue<MockBroker>>| {
            tokio::spawn(async move { queue.consume_loop().await })
        };
        let first = spawn_loop(queue.clone());
        let second = spawn_loop(queue.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.stop_consuming();

        let results = [first.await.unwrap(), second.await.unwrap()];
        let refused = results
            .iter()
            .filter(|r| matches!(r, Err(IngestionError::AlreadyConsuming)))
            .count();
        assert_eq!(refused, 1);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    }

    #[tokio::test]
    async fn test_fatal_error_ends_loop_and_closes_channel() {
        let broker = MockBroker::from_messages(vec![message("a")])
            .then_fail(BrokerError::fatal("connection lost"));
        let queue = BrokerQueue::new(broker, 10);
        let rx = queue.messages();

        let result = queue.consume_loop().await;
        match result {
            Err(IngestionError::Broker { source, .. }) => {
                assert!(source.to_string().contains("connection lost"))
            }
            other => panic!("expected broker failure, got {other:?}"),
        }

        assert_eq!(rx.recv().await.unwrap().token, "a");
        assert!(rx.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_messages_are_skipped() {
        let broker = MockBroker::scripted(vec![
            Err(BrokerError::malformed("bad json")),
            Ok(message("a")),
        ]);
        let queue = Arc::new(BrokerQueue::new(broker, 10));
        let rx = queue.messages();

        let handle = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.consume_loop().await })
        };

        assert_eq!(rx.recv().await.unwrap().token, "a");
        queue.stop_consuming();
        handle.await.unwrap().unwrap();

        let snapshot = queue.metrics().snapshot();
        assert_eq!(snapshot.malformed, 1);
        assert_eq!(snapshot.messages_received, 1);
    }
}
