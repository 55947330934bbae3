//! Fire-and-forget command publishing.

use std::sync::Arc;

use serde::Serialize;

use crate::messaging::broker::Broker;
use crate::messaging::envelope::Command;
use crate::observability::metrics;

/// Whether the notification that followed a mutation reached the broker.
///
/// A failed delivery never undoes the mutation; it is reported alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Delivery {
    Published,
    Failed(String),
    /// The mutation changed nothing the fleet needs to hear about.
    NotRequired,
}

/// A mutated value together with the delivery of the command it triggered.
#[derive(Debug, Clone, Serialize)]
pub struct Applied<T> {
    pub value: T,
    pub delivery: Delivery,
}

/// Publishes commands to the outbound queue.
pub struct CommandPublisher {
    broker: Arc<dyn Broker>,
    queue: String,
}

impl CommandPublisher {
    pub fn new(broker: Arc<dyn Broker>, queue: impl Into<String>) -> Self {
        Self { broker, queue: queue.into() }
    }

    pub async fn publish(&self, command: &Command) -> Delivery {
        let kind = command.kind();
        let payload = match command.encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(kind, error = %e, "Failed to encode command");
                metrics::record_command_published(kind, false);
                return Delivery::Failed(e.to_string());
            }
        };

        match self.broker.publish(&self.queue, payload).await {
            Ok(()) => {
                tracing::debug!(kind, queue = %self.queue, "Command published");
                metrics::record_command_published(kind, true);
                Delivery::Published
            }
            Err(e) => {
                tracing::warn!(kind, queue = %self.queue, error = %e, "Command publish failed");
                metrics::record_command_published(kind, false);
                Delivery::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::broker::MemoryBroker;

    #[tokio::test]
    async fn test_publish_reports_delivery() {
        let broker = Arc::new(MemoryBroker::new(4));
        let publisher = CommandPublisher::new(broker.clone(), "out");
        let cmd = Command::RemoveReplica { name: "r".into(), url: "http://r:1".into() };

        assert_eq!(publisher.publish(&cmd).await, Delivery::Published);
        assert_eq!(broker.backlog_len("out"), 1);

        broker.set_available(false);
        assert_eq!(
            publisher.publish(&cmd).await,
            Delivery::Failed("broker unavailable".into())
        );
    }
}
