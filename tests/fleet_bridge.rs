//! Proxy instances talking to the control plane over the WebSocket bridge.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use fleet_admin::security::CallerIdentity;
use fleet_admin::store::ReplicaStatus;

mod common;

async fn connect(
    plane: &common::TestPlane,
    key: &str,
) -> Result<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    tokio_tungstenite::tungstenite::Error,
> {
    let mut request = format!("ws://{}/fleet/connect", plane.addr)
        .into_client_request()
        .unwrap();
    request.headers_mut().insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {}", key)).unwrap(),
    );
    tokio_tungstenite::connect_async(request).await.map(|(ws, _)| ws)
}

async fn next_json<S>(ws: &mut S) -> Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(std::time::Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_bridge_rejects_unknown_key() {
    let plane = common::start_control_plane(common::test_config()).await;
    assert!(connect(&plane, "nope").await.is_err());
}

#[tokio::test]
async fn test_commands_flow_to_connected_proxy() {
    let backend = common::start_mock_backend(200).await;
    let plane = common::start_control_plane(common::test_config()).await;
    let mut ws = connect(&plane, common::API_KEY).await.unwrap();

    let url = format!("http://{}", backend);
    plane
        .state
        .replicas
        .register(&CallerIdentity::new("ops"), "web-1", &url, "health")
        .await
        .unwrap();

    let command = next_json(&mut ws).await;
    assert_eq!(command, json!({"name": "add-replica", "body": {"name": "web-1", "url": url}}));
}

#[tokio::test]
async fn test_fleet_events_reach_the_control_plane() {
    let backend = common::start_mock_backend(200).await;
    let plane = common::start_control_plane(common::test_config()).await;
    let url = format!("http://{}", backend);
    let caller = CallerIdentity::new("ops");

    let replica = plane.state.replicas.register(&caller, "web-1", &url, "health").await.unwrap().value;
    plane.state.replicas.set_status(&caller, replica.id, "active").await.unwrap();

    let mut ws = connect(&plane, common::API_KEY).await.unwrap();
    ws.send(Message::Text(
        json!({"name": "replica-failed", "body": url}).to_string().into(),
    ))
    .await
    .unwrap();
    ws.send(Message::Text(r#"{"name":"self-destruct","body":{}}"#.to_string().into()))
        .await
        .unwrap();
    ws.send(Message::Binary(
        json!({"name": "parameters-update-failed", "body": {"error": "pool_size rejected"}})
            .to_string()
            .into_bytes()
            .into(),
    ))
    .await
    .unwrap();

    let replicas = plane.state.replicas.clone();
    assert!(
        common::eventually(|| {
            let replicas = replicas.clone();
            async move {
                replicas
                    .activity()
                    .await
                    .map(|log| {
                        log.first().map(|e| e.message.as_str())
                            == Some("Proxy fleet failed to apply prequal parameters: pool_size rejected")
                    })
                    .unwrap_or(false)
            }
        })
        .await
    );

    let stored = plane.state.replicas.by_id(replica.id).await.unwrap();
    assert_eq!(stored.status, ReplicaStatus::Inactive);

    let log = plane.state.replicas.activity().await.unwrap();
    assert_eq!(log[1].message, "Replica 'web-1' failed in the proxy fleet");
}
