//! WebSocket bridge between the broker queues and connected proxy instances.
//!
//! # Data Flow
//! ```text
//! outbound queue ──subscribe──→ session ──text frame──→ proxy instance
//! proxy instance ──text/binary frame──→ session ──publish──→ inbound queue
//! ```
//!
//! Each session holds its own outbound subscription, so every connected
//! proxy instance sees every command.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::messaging::broker::Broker;
use crate::observability::metrics;
use crate::security::CallerIdentity;

#[derive(Clone)]
pub struct FleetBridge {
    broker: Arc<dyn Broker>,
    outbound_queue: String,
    inbound_queue: String,
    shutdown: broadcast::Sender<()>,
}

impl FleetBridge {
    pub fn new(
        broker: Arc<dyn Broker>,
        outbound_queue: impl Into<String>,
        inbound_queue: impl Into<String>,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        Self {
            broker,
            outbound_queue: outbound_queue.into(),
            inbound_queue: inbound_queue.into(),
            shutdown,
        }
    }

    /// Drive one upgraded connection until either side closes or shutdown.
    pub async fn serve(self, mut socket: WebSocket, caller: CallerIdentity) {
        let mut subscription = match self.broker.subscribe(&self.outbound_queue).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::warn!(caller = %caller, error = %e, "Bridge could not subscribe to outbound queue");
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
        };
        let mut shutdown = self.shutdown.subscribe();
        let session = Uuid::new_v4();

        tracing::info!(caller = %caller, session = %session, "Proxy instance connected to fleet bridge");
        metrics::record_bridge_sessions(1.0);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                command = subscription.next() => match command {
                    Some(payload) => match String::from_utf8(payload) {
                        Ok(text) => {
                            if socket.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::error!(error = %e, "Outbound command is not UTF-8, skipped"),
                    },
                    None => {
                        tracing::warn!(session = %session, "Outbound subscription lost, closing bridge session");
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                },
                frame = socket.recv() => match frame {
                    Some(Ok(Message::Text(text))) => self.forward(text.as_str().as_bytes().to_vec()).await,
                    Some(Ok(Message::Binary(bytes))) => self.forward(bytes.to_vec()).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(session = %session, error = %e, "Bridge socket error");
                        break;
                    }
                },
            }
        }

        metrics::record_bridge_sessions(-1.0);
        tracing::info!(caller = %caller, session = %session, "Proxy instance disconnected from fleet bridge");
    }

    async fn forward(&self, payload: Vec<u8>) {
        if let Err(e) = self.broker.publish(&self.inbound_queue, payload).await {
            tracing::warn!(queue = %self.inbound_queue, error = %e, "Dropped inbound frame");
        }
    }
}
