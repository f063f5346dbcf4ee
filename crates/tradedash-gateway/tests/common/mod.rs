/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for tradedash-gateway tests

use serde_json::{Value, json};
use std::time::Duration;
use tradedash_gateway::{ClientConfig, GatewayClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server with short deadlines
pub fn client_for(server: &MockServer) -> GatewayClient {
    let mut config = ClientConfig::default().with_base_url(server.uri());
    config.status_timeout = Duration::from_millis(300);
    config.control_timeout = Duration::from_millis(300);
    config.data_timeout = Duration::from_millis(300);
    GatewayClient::with_config(config).expect("client init")
}

/// A `/bot/status` body reporting a running BTCUSDT bot
#[allow(dead_code)]
pub fn running_status(timestamp: &str) -> Value {
    json!({
        "status": "running",
        "symbol": "BTCUSDT",
        "wallet_id": "abc123",
        "start_time": "2024-01-01T00:00:00",
        "last_operation": "BUY 0.001 BTC",
        "config": {
            "symbol": "BTCUSDT",
            "wallet_id": "abc123",
            "max_amount": 100,
            "interval_seconds": 60,
            "strategy": "simple",
            "buy_threshold": 0.5,
            "sell_threshold": 1.0
        },
        "timestamp": timestamp
    })
}
