//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the configured store
//! - Connect the inbound consumer, retrying with backoff
//! - Wire managers, publisher and bridge into the shared `AppState`
//!
//! # Design Decisions
//! - Fail fast but politely: every failure is a `StartupError`, not a panic
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::config::AdminConfig;
use crate::health::HttpHealthProbe;
use crate::http::AppState;
use crate::messaging::{
    CommandPublisher, EventConsumer, EventDispatcher, FleetBridge, MemoryBroker, MessagingError,
};
use crate::lifecycle::Shutdown;
use crate::parameters::ParameterManager;
use crate::replicas::ReplicaManager;
use crate::resilience::RetryPolicy;
use crate::security::ApiKeyRegistry;
use crate::statistics::StatisticsAggregator;
use crate::store::{open_store, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("broker error: {0}")]
    Broker(#[from] MessagingError),

    #[error("health probe client error: {0}")]
    Probe(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the binary needs to start serving.
pub struct Services {
    pub state: AppState,
    pub consumer: EventConsumer,
    pub broker: Arc<MemoryBroker>,
}

pub async fn bootstrap(config: &AdminConfig, shutdown: &Shutdown) -> Result<Services, StartupError> {
    let store = open_store(&config.store)?;
    let broker = Arc::new(MemoryBroker::new(config.broker.queue_capacity));
    let probe = Arc::new(HttpHealthProbe::new(&config.health_check)?);

    let publisher = Arc::new(CommandPublisher::new(
        broker.clone(),
        config.broker.outbound_queue.clone(),
    ));
    let replicas = Arc::new(ReplicaManager::new(
        store.clone(),
        probe,
        publisher.clone(),
        config.messaging.trust_replica_added,
    ));
    let parameters = Arc::new(ParameterManager::new(store.clone(), publisher));
    let statistics = Arc::new(StatisticsAggregator::new(store));

    let dispatcher = Arc::new(EventDispatcher::new(
        replicas.clone(),
        parameters.clone(),
        statistics.clone(),
    ));
    let consumer = EventConsumer::connect(
        broker.clone(),
        config.broker.inbound_queue.clone(),
        dispatcher,
        RetryPolicy::from_broker_config(&config.broker),
    )
    .await?;

    let bridge = FleetBridge::new(
        broker.clone(),
        config.broker.outbound_queue.clone(),
        config.broker.inbound_queue.clone(),
        shutdown.sender(),
    );

    tracing::info!(
        store = ?config.store.backend,
        outbound_queue = %config.broker.outbound_queue,
        inbound_queue = %config.broker.inbound_queue,
        "Control plane services initialized"
    );

    Ok(Services {
        state: AppState {
            replicas,
            parameters,
            statistics,
            bridge,
            api_keys: Arc::new(ApiKeyRegistry::from_config(&config.admin.api_keys)),
        },
        consumer,
        broker,
    })
}
