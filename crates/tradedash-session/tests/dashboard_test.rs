/*
[INPUT]:  Mock HTTP backend (wiremock) driven through the real GatewayClient
[OUTPUT]: End-to-end connect/start/disconnect verification
[POS]:    Integration test layer - dashboard over HTTP
[UPDATE]: When changing backend routes or dashboard flows
*/

use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tradedash_gateway::{BotStrategy, ClientConfig, GatewayClient, TradingPair};
use tradedash_session::{
    BotConfig, BotState, ClientError, ControlSettings, ControlState, Dashboard, DashboardSettings,
    SessionStore,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dashboard_for(server: &MockServer) -> Dashboard {
    let client = GatewayClient::with_config(ClientConfig::default().with_base_url(server.uri()))
        .expect("client init");
    let settings = DashboardSettings {
        control: ControlSettings {
            confirm_delay: Duration::from_millis(5),
            ..ControlSettings::default()
        },
        ..DashboardSettings::default()
    };
    Dashboard::new(Arc::new(client), Arc::new(SessionStore::in_memory(None)), settings)
}

fn scenario_config() -> BotConfig {
    BotConfig {
        symbol: TradingPair::BtcUsdt,
        max_amount: Decimal::from(100),
        interval_seconds: 60,
        strategy: BotStrategy::Simple,
        buy_threshold: Some(Decimal::new(5, 1)),
        sell_threshold: Some(Decimal::ONE),
    }
}

async fn mount_connect(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/wallet/connect"))
        .and(body_partial_json(json!({ "api_key": "key", "use_testnet": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "wallet_id": "abc123" })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_stopped_once(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/bot/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "stopped", "timestamp": "2024-01-01T00:00:00Z" })),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn connect_then_start_reaches_running() {
    let server = MockServer::start().await;
    mount_connect(&server).await;
    mount_stopped_once(&server).await;
    Mock::given(method("GET"))
        .and(path("/bot/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "running",
            "symbol": "BTCUSDT",
            "wallet_id": "abc123",
            "config": {
                "symbol": "BTCUSDT",
                "max_amount": 100,
                "interval_seconds": 60,
                "strategy": "simple",
                "buy_threshold": 0.5,
                "sell_threshold": 1.0
            },
            "timestamp": "2024-01-01T00:00:05Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot/start"))
        .and(body_partial_json(json!({
            "wallet_id": "abc123",
            "symbol": "BTCUSDT",
            "max_amount": 100,
            "interval_seconds": 60,
            "strategy": "simple"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard_for(&server);
    let wallet = dashboard.connect_wallet("key", "secret", true).await.unwrap();
    assert_eq!(wallet.as_str(), "abc123");
    assert_eq!(dashboard.snapshot().state, ControlState::Stopped);

    let status = dashboard.start_bot(&scenario_config()).await.unwrap();

    assert_eq!(status.state, BotState::Running);
    let snapshot = dashboard.snapshot();
    assert_eq!(snapshot.state, ControlState::Running);
    assert!(!snapshot.busy);
    assert_eq!(
        snapshot.status.and_then(|status| status.config).map(|config| config.strategy),
        Some("simple".to_string())
    );
}

#[tokio::test]
async fn backend_rejection_is_reported_verbatim() {
    let server = MockServer::start().await;
    mount_connect(&server).await;
    mount_stopped_once(&server).await;
    Mock::given(method("POST"))
        .and(path("/bot/start"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Insufficient balance" })),
        )
        .mount(&server)
        .await;

    let dashboard = dashboard_for(&server);
    dashboard.connect_wallet("key", "secret", true).await.unwrap();

    let err = dashboard.start_bot(&scenario_config()).await.unwrap_err();

    assert_eq!(
        err,
        ClientError::Gateway {
            message: "Insufficient balance".to_string(),
            status: Some(400),
        }
    );
    let snapshot = dashboard.snapshot();
    assert!(!snapshot.busy);
    assert_eq!(snapshot.state, ControlState::error("Insufficient balance"));
}

#[tokio::test]
async fn balances_are_scoped_to_connected_wallet() {
    let server = MockServer::start().await;
    mount_connect(&server).await;
    mount_stopped_once(&server).await;
    Mock::given(method("GET"))
        .and(path("/wallet/balance"))
        .and(query_param("wallet_id", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "balances": [{ "asset": "USDT", "free": "250.5", "locked": "0" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard_for(&server);
    dashboard.connect_wallet("key", "secret", true).await.unwrap();

    let balances = dashboard.balances().await.unwrap();

    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].free, Decimal::new(2505, 1));
}

#[tokio::test]
async fn disconnect_sends_nothing_afterwards() {
    let server = MockServer::start().await;
    mount_connect(&server).await;
    mount_stopped_once(&server).await;

    let dashboard = dashboard_for(&server);
    dashboard.connect_wallet("key", "secret", true).await.unwrap();
    dashboard.disconnect().unwrap();

    let err = dashboard.start_bot(&scenario_config()).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(dashboard.snapshot().state, ControlState::Idle);
    // connect + one status fetch, nothing after the disconnect
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn shutdown_waits_for_background_tasks() {
    let server = MockServer::start().await;
    mount_connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/bot/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "stopped", "timestamp": "2024-01-01T00:00:00Z" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wallet/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "balances": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/trading/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "orders": [], "count": 0 })))
        .mount(&server)
        .await;

    let dashboard = dashboard_for(&server);
    dashboard.connect_wallet("key", "secret", true).await.unwrap();
    dashboard.start_background().unwrap();
    assert!(dashboard.background_running());

    tokio::time::timeout(Duration::from_secs(2), dashboard.shutdown())
        .await
        .expect("shutdown hung");

    assert!(!dashboard.background_running());
}

#[tokio::test]
async fn malformed_status_value_is_a_bot_error_not_a_lost_connection() {
    let server = MockServer::start().await;
    mount_connect(&server).await;
    Mock::given(method("GET"))
        .and(path("/bot/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": null, "timestamp": "2024-01-01T00:00:00Z" })),
        )
        .mount(&server)
        .await;

    let dashboard = dashboard_for(&server);
    dashboard.connect_wallet("key", "secret", true).await.unwrap();
    for _ in 0..3 {
        dashboard.refresh_status().await.unwrap();
    }

    let snapshot = dashboard.snapshot();
    assert!(!snapshot.state.is_connection_lost());
    assert!(matches!(
        &snapshot.state,
        ControlState::Error { message, .. } if message.starts_with("unrecognized bot status")
    ));
    assert_eq!(snapshot.consecutive_failures, 0);
}
