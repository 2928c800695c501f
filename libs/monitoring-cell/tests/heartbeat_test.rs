use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path};

use monitoring_cell::{Connectivity, HeartbeatService, PollPolicy};
use shared_backend::BackendClient;
use shared_utils::test_utils::TestConfig;

fn create_heartbeat(base_url: &str, interval: Duration) -> HeartbeatService {
    let config = TestConfig::with_base_url(base_url).to_app_config();
    HeartbeatService::with_client(BackendClient::new(&config), "/machines", PollPolicy::fixed(interval))
}

#[tokio::test]
async fn test_reachable_backend_is_online() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/machines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let heartbeat = create_heartbeat(&mock_server.uri(), Duration::from_secs(10));
    assert_eq!(heartbeat.check_once().await, Connectivity::Online);
    assert!(heartbeat.status().is_online());
}

#[tokio::test]
async fn test_transitions_are_published() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/machines"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/machines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let heartbeat = create_heartbeat(&mock_server.uri(), Duration::from_secs(10));
    let mut rx = heartbeat.subscribe();

    assert_eq!(heartbeat.check_once().await, Connectivity::Offline);
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), Connectivity::Offline);

    assert_eq!(heartbeat.check_once().await, Connectivity::Online);
    assert_eq!(*rx.borrow_and_update(), Connectivity::Online);

    // Same state again is not a change.
    heartbeat.check_once().await;
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_unreachable_backend_is_offline() {
    let heartbeat = create_heartbeat("http://127.0.0.1:9", Duration::from_secs(10));
    assert_eq!(heartbeat.check_once().await, Connectivity::Offline);
}

#[tokio::test]
async fn test_run_pings_until_shutdown() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/machines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let heartbeat = Arc::new(create_heartbeat(&mock_server.uri(), Duration::from_millis(40)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task = {
        let heartbeat = heartbeat.clone();
        tokio::spawn(async move { heartbeat.run(shutdown_rx).await })
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();

    let pings = mock_server.received_requests().await.unwrap().len();
    assert!(pings >= 2, "expected repeated pings, got {}", pings);
}
