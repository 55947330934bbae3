//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the admin API and the fleet bridge
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use axum::http::StatusCode;
use axum::Router;

use crate::admin::setup_admin_router;
use crate::http::request::{make_request_span, request_id_header};
use crate::messaging::FleetBridge;
use crate::parameters::ParameterManager;
use crate::replicas::ReplicaManager;
use crate::security::ApiKeyRegistry;
use crate::statistics::StatisticsAggregator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub replicas: Arc<ReplicaManager>,
    pub parameters: Arc<ParameterManager>,
    pub statistics: Arc<StatisticsAggregator>,
    pub bridge: FleetBridge,
    pub api_keys: Arc<ApiKeyRegistry>,
}

/// HTTP server for the admin API.
pub struct AdminServer {
    router: Router,
}

impl AdminServer {
    pub fn new(state: AppState, request_timeout: Duration) -> Self {
        Self { router: Self::build_router(state, request_timeout) }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        with_middleware(setup_admin_router(state), request_timeout)
    }

    /// The fully layered router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Admin HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Admin HTTP server draining");
            })
            .await?;

        tracing::info!("Admin HTTP server stopped");
        Ok(())
    }
}

/// Request ID, trace span and timeout around `router`.
fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::X_REQUEST_ID;
    use axum::routing::get;

    async fn serve(router: Router) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let addr = serve(with_middleware(router, Duration::from_millis(100))).await;

        let response = reqwest::get(format!("http://{}/slow", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let router = Router::new().route("/fast", get(|| async { "ok" }));
        let addr = serve(with_middleware(router, Duration::from_secs(5))).await;

        let response = reqwest::get(format!("http://{}/fast", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }
}
