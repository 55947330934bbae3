//! Inbound event consumption.
//!
//! # Responsibilities
//! - Hold the single subscription to the inbound queue
//! - Decode each payload once and route the typed event
//! - Re-subscribe with backoff when the broker drops the subscription
//!
//! Events are handled strictly one at a time: each finishes before the next
//! payload is read.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::error::AdminResult;
use crate::messaging::broker::{Broker, BrokerError, Subscription};
use crate::messaging::envelope::{decode_event, DecodeError, InboundEvent};
use crate::observability::metrics;
use crate::parameters::{ParameterAck, ParameterManager};
use crate::replicas::{FleetReport, ReplicaManager};
use crate::resilience::{retry_with_backoff, RetryPolicy};
use crate::security::CallerIdentity;
use crate::statistics::StatisticsAggregator;
use crate::store::StatisticsDelta;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("gave up on queue '{queue}' after {attempts} attempts: {last}")]
    RetriesExhausted {
        queue: String,
        attempts: u32,
        last: BrokerError,
    },
}

/// What happened to one inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled(&'static str),
    Unrecognized(String),
    Malformed,
    Failed(&'static str),
}

/// Routes decoded events to the managers that own them.
pub struct EventDispatcher {
    replicas: Arc<ReplicaManager>,
    parameters: Arc<ParameterManager>,
    statistics: Arc<StatisticsAggregator>,
}

impl EventDispatcher {
    pub fn new(
        replicas: Arc<ReplicaManager>,
        parameters: Arc<ParameterManager>,
        statistics: Arc<StatisticsAggregator>,
    ) -> Self {
        Self { replicas, parameters, statistics }
    }

    /// Decode and dispatch one payload. Never fails; problems are logged and
    /// the payload dropped.
    pub async fn handle_raw(&self, payload: &[u8]) -> DispatchOutcome {
        let event = match decode_event(payload) {
            Ok(event) => event,
            Err(DecodeError::UnknownKind(kind)) => {
                tracing::warn!(kind = %kind, "Unrecognized event dropped");
                metrics::record_event_dropped("unrecognized");
                return DispatchOutcome::Unrecognized(kind);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed event dropped");
                metrics::record_event_dropped("malformed");
                return DispatchOutcome::Malformed;
            }
        };

        let kind = event.kind();
        match self.dispatch(event).await {
            Ok(()) => {
                tracing::debug!(kind, "Event handled");
                metrics::record_event_consumed(kind);
                DispatchOutcome::Handled(kind)
            }
            Err(e) => {
                tracing::error!(kind, error = %e, "Event handling failed");
                metrics::record_event_dropped("failed");
                DispatchOutcome::Failed(kind)
            }
        }
    }

    /// Route one event. Fleet-originated work runs as the proxy fleet identity.
    pub async fn dispatch(&self, event: InboundEvent) -> AdminResult<()> {
        let fleet = CallerIdentity::proxy_fleet();
        match event {
            InboundEvent::ReplicaAdded(target) => {
                self.replicas.apply_fleet_report(&fleet, FleetReport::Added, &target).await?;
            }
            InboundEvent::ReplicaFailed(target) => {
                self.replicas.apply_fleet_report(&fleet, FleetReport::Failed, &target).await?;
            }
            InboundEvent::ReplicaRemoved(target) => {
                self.replicas.apply_fleet_report(&fleet, FleetReport::Removed, &target).await?;
            }
            InboundEvent::ParametersUpdated { fields } => {
                self.parameters.record_fleet_ack(&fleet, ParameterAck::Applied { fields }).await?;
            }
            InboundEvent::ParametersUpdateFailed { error } => {
                self.parameters.record_fleet_ack(&fleet, ParameterAck::Failed { error }).await?;
            }
            InboundEvent::Statistics(reports) => {
                let batch: Vec<StatisticsDelta> = reports.into_iter().map(Into::into).collect();
                self.statistics.accumulate(&batch).await?;
            }
        }
        Ok(())
    }
}

async fn subscribe_with_retry(
    broker: &dyn Broker,
    queue: &str,
    policy: &RetryPolicy,
) -> Result<Subscription, MessagingError> {
    retry_with_backoff(policy, "subscribe", move || broker.subscribe(queue))
        .await
        .map_err(|last| MessagingError::RetriesExhausted {
            queue: queue.to_string(),
            attempts: policy.max_attempts,
            last,
        })
}

/// The long-running inbound loop.
pub struct EventConsumer {
    broker: Arc<dyn Broker>,
    queue: String,
    dispatcher: Arc<EventDispatcher>,
    policy: RetryPolicy,
    subscription: Subscription,
}

impl EventConsumer {
    /// Subscribe to `queue`, retrying with backoff before giving up.
    pub async fn connect(
        broker: Arc<dyn Broker>,
        queue: impl Into<String>,
        dispatcher: Arc<EventDispatcher>,
        policy: RetryPolicy,
    ) -> Result<Self, MessagingError> {
        let queue = queue.into();
        let subscription = subscribe_with_retry(broker.as_ref(), &queue, &policy).await?;
        tracing::info!(queue = %queue, "Inbound consumer subscribed");

        Ok(Self { broker, queue, dispatcher, policy, subscription })
    }

    /// Consume until shutdown. Returns an error only when re-subscribing
    /// after a lost subscription exhausts its retries.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), MessagingError> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Inbound consumer received shutdown signal, exiting loop");
                    return Ok(());
                }
                next = self.subscription.next() => match next {
                    Some(payload) => {
                        self.dispatcher.handle_raw(&payload).await;
                    }
                    None => {
                        tracing::warn!(queue = %self.queue, "Inbound subscription lost, reconnecting");
                        let resubscribed = tokio::select! {
                            _ = shutdown.recv() => return Ok(()),
                            result = subscribe_with_retry(self.broker.as_ref(), &self.queue, &self.policy) => result,
                        };
                        self.subscription = resubscribed?;
                        tracing::info!(queue = %self.queue, "Inbound consumer re-subscribed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{HealthProbe, ProbeFailure};
    use crate::messaging::broker::MemoryBroker;
    use crate::messaging::publisher::CommandPublisher;
    use crate::security::CallerIdentity;
    use crate::store::{MemoryStore, ReplicaStatus, Store};
    use async_trait::async_trait;
    use std::time::Duration;
    use url::Url;

    struct AlwaysHealthy;

    #[async_trait]
    impl HealthProbe for AlwaysHealthy {
        async fn probe(&self, _url: &Url) -> Result<(), ProbeFailure> {
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        broker: Arc<MemoryBroker>,
        replicas: Arc<ReplicaManager>,
        dispatcher: Arc<EventDispatcher>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let broker = Arc::new(MemoryBroker::new(64));
        let publisher = Arc::new(CommandPublisher::new(broker.clone(), "out"));
        let replicas = Arc::new(ReplicaManager::new(
            store.clone(),
            Arc::new(AlwaysHealthy),
            publisher.clone(),
            false,
        ));
        let parameters = Arc::new(ParameterManager::new(store.clone(), publisher));
        let statistics = Arc::new(StatisticsAggregator::new(store.clone()));
        let dispatcher = Arc::new(EventDispatcher::new(replicas.clone(), parameters, statistics));
        Fixture { store, broker, replicas, dispatcher }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, base_delay_ms: 1, max_delay_ms: 5 }
    }

    #[tokio::test]
    async fn test_unrecognized_event_changes_nothing() {
        let f = fixture();
        let outcome = f.dispatcher.handle_raw(br#"{"name":"reboot-everything","body":{}}"#).await;
        assert_eq!(outcome, DispatchOutcome::Unrecognized("reboot-everything".into()));
        assert!(f.store.activity().await.unwrap().is_empty());

        assert_eq!(f.dispatcher.handle_raw(b"{{{").await, DispatchOutcome::Malformed);
    }

    #[tokio::test]
    async fn test_replica_failed_marks_inactive() {
        let f = fixture();
        let caller = CallerIdentity::new("admin");
        let r = f.replicas.register(&caller, "r", "http://r:1", "health").await.unwrap().value;
        f.replicas.set_status(&caller, r.id, "active").await.unwrap();

        let outcome = f
            .dispatcher
            .handle_raw(br#"{"name":"replica-failed","body":{"name":"r","url":"http://r:1"}}"#)
            .await;
        assert_eq!(outcome, DispatchOutcome::Handled("replica-failed"));
        assert_eq!(f.replicas.by_id(r.id).await.unwrap().status, ReplicaStatus::Inactive);
    }

    #[tokio::test]
    async fn test_statistics_event_accumulates() {
        let f = fixture();
        let payload = br#"{"name":"statistics","body":[{"replica_name":"http://r:1","statistics":{"successful_requests":5,"failed_requests":1}}]}"#;
        f.dispatcher.handle_raw(payload).await;
        f.dispatcher.handle_raw(payload).await;

        let records = f.store.statistics().await.unwrap();
        assert_eq!(records[0].successful_requests, 10);
        assert_eq!(records[0].failed_requests, 2);
    }

    #[tokio::test]
    async fn test_consumer_survives_disconnect() {
        let f = fixture();
        let consumer = EventConsumer::connect(f.broker.clone(), "in", f.dispatcher.clone(), fast_policy(5))
            .await
            .unwrap();
        let (tx, _) = broadcast::channel(1);
        let handle = tokio::spawn(consumer.run(tx.subscribe()));

        f.broker
            .publish("in", br#"{"name":"parameters-updated","body":{"fields":["mu"]}}"#.to_vec())
            .await
            .unwrap();
        f.broker.disconnect("in");
        f.broker
            .publish("in", br#"{"name":"parameters-update-failed","body":{"error":"boom"}}"#.to_vec())
            .await
            .unwrap();

        let mut seen = 0;
        for _ in 0..100 {
            seen = f.store.activity().await.unwrap().len();
            if seen == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(seen, 2);

        tx.send(()).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_connect_gives_up_when_broker_stays_down() {
        let f = fixture();
        f.broker.set_available(false);
        let err = EventConsumer::connect(f.broker.clone(), "in", f.dispatcher.clone(), fast_policy(3))
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MessagingError::RetriesExhausted { attempts: 3, last: BrokerError::Unavailable, .. }
        ));
    }

    #[tokio::test]
    async fn test_run_errors_when_reconnect_exhausts() {
        let f = fixture();
        let consumer = EventConsumer::connect(f.broker.clone(), "in", f.dispatcher.clone(), fast_policy(2))
            .await
            .unwrap();
        let (_tx, rx) = broadcast::channel(1);

        f.broker.set_available(false);
        let result = tokio::time::timeout(Duration::from_secs(2), consumer.run(rx)).await.unwrap();
        assert!(matches!(result, Err(MessagingError::RetriesExhausted { .. })));
    }
}
