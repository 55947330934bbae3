//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use fleet_admin::config::{AdminConfig, ApiKeyConfig};
use fleet_admin::http::AppState;
use fleet_admin::lifecycle::{bootstrap, Shutdown};
use fleet_admin::messaging::MemoryBroker;
use fleet_admin::AdminServer;

pub const API_KEY: &str = "test-operator-key";

/// Default configuration with the test bearer key installed.
#[allow(dead_code)]
pub fn test_config() -> AdminConfig {
    let mut config = AdminConfig::default();
    config.admin.api_keys.push(ApiKeyConfig {
        operator: "tester".to_string(),
        key: API_KEY.to_string(),
    });
    config
}

/// Start a programmable mock backend on an ephemeral port. `f` decides the
/// status and body of every response.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 2048];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A mock backend that always answers with `status`.
#[allow(dead_code)]
pub async fn start_mock_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { (status, "ok".to_string()) }).await
}

/// A running control plane bound to an ephemeral port.
#[allow(dead_code)]
pub struct TestPlane {
    pub addr: SocketAddr,
    pub broker: Arc<MemoryBroker>,
    pub state: AppState,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestPlane {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestPlane {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[allow(dead_code)]
pub async fn start_control_plane(config: AdminConfig) -> TestPlane {
    let shutdown = Shutdown::new();
    let services = bootstrap(&config, &shutdown).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(services.consumer.run(shutdown.subscribe()));
    let server = AdminServer::new(services.state.clone(), Duration::from_secs(5));
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestPlane { addr, broker: services.broker, state: services.state, shutdown }
}

/// Poll `check` until it returns true or two seconds pass.
#[allow(dead_code)]
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
