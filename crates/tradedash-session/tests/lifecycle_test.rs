/*
[INPUT]:  Bot start/stop scenarios against a scripted backend
[OUTPUT]: Control state machine and busy-flag verification
[POS]:    Integration test layer - bot lifecycle
[UPDATE]: When changing start/stop, confirmation or busy semantics
*/

mod common;

use common::*;
use rust_decimal::Decimal;
use std::time::Duration;
use tokio_test::assert_ok;
use tradedash_gateway::{BotStrategy, ControlResponse, TradingPair};
use tradedash_session::{BotConfig, BotState, ClientError, ControlSettings, ControlState};

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

/// Harness whose first status fetch reports a stopped bot
async fn stopped_harness(settings: ControlSettings) -> Harness {
    let h = harness(Some("abc123"), settings);
    h.gateway.push_status(Ok(stopped("2024-01-01T00:00:00Z")));
    assert_ok!(h.facade.refresh().await);
    assert_eq!(h.board.snapshot().state, ControlState::Stopped);
    h
}

#[tokio::test]
async fn start_reaches_running_with_confirmed_config() {
    let h = stopped_harness(fast_control()).await;
    h.gateway.set_start(Ok(ControlResponse {
        success: Some(true),
        ..ControlResponse::default()
    }));
    h.gateway.set_status_fallback(Ok(running("2024-01-01T00:00:05Z")));

    let status = assert_ok!(h.facade.start_bot(&scenario_config()).await);

    assert_eq!(status.state, BotState::Running);
    let snapshot = h.board.snapshot();
    assert_eq!(snapshot.state, ControlState::Running);
    assert!(!snapshot.busy);
    let config = snapshot.status.and_then(|status| status.config).unwrap();
    assert_eq!(config.symbol, "BTCUSDT");

    let request = h.gateway.last_start.lock().unwrap().clone().unwrap();
    assert_eq!(request.wallet_id, "abc123");
    assert_eq!(request.sell_threshold, Some(Decimal::ONE));
}

#[tokio::test]
async fn concurrent_start_sends_one_request() {
    let h = stopped_harness(fast_control()).await;
    h.gateway.set_control_delay(Duration::from_millis(100));
    h.gateway.set_status_fallback(Ok(running("2024-01-01T00:00:05Z")));
    let config = scenario_config();

    let (first, second) = tokio::join!(h.facade.start_bot(&config), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let busy = h.board.snapshot().busy;
        (busy, h.facade.start_bot(&config).await)
    });

    assert!(first.is_ok());
    let (was_busy, second) = second;
    assert!(was_busy);
    assert!(matches!(second, Err(ClientError::StateConflict(_))));
    assert_eq!(h.gateway.start_calls(), 1);
}

#[tokio::test]
async fn invalid_config_without_wallet_sends_nothing() {
    let h = harness(None, fast_control());
    let config = BotConfig {
        max_amount: Decimal::ZERO,
        ..scenario_config()
    };

    let err = h.facade.start_bot(&config).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(h.gateway.start_calls(), 0);
    assert_eq!(h.gateway.status_calls(), 0);
    assert_eq!(h.board.snapshot().state, ControlState::Idle);
}

#[tokio::test]
async fn invalid_config_leaves_state_untouched() {
    let h = stopped_harness(fast_control()).await;
    let config = BotConfig {
        interval_seconds: 1,
        ..scenario_config()
    };

    let err = h.facade.start_bot(&config).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(h.gateway.start_calls(), 0);
    assert_eq!(h.board.snapshot().state, ControlState::Stopped);
}

#[tokio::test]
async fn start_timeout_releases_busy_flag() {
    let h = stopped_harness(ControlSettings {
        control_timeout: Duration::from_millis(50),
        ..fast_control()
    })
    .await;
    h.gateway.set_control_delay(Duration::from_millis(500));

    let err = h.facade.start_bot(&scenario_config()).await.unwrap_err();

    assert!(matches!(err, ClientError::Transport { .. }));
    let snapshot = h.board.snapshot();
    assert!(!snapshot.busy);
    assert_eq!(snapshot.state, ControlState::error("request timed out after 50ms"));

    // Errors are not sticky: the next good fetch reclassifies
    h.gateway.push_status(Ok(stopped("2024-01-01T00:00:10Z")));
    assert_ok!(h.facade.refresh().await);
    assert_eq!(h.board.snapshot().state, ControlState::Stopped);
}

#[tokio::test]
async fn rejected_start_keeps_backend_message() {
    let h = stopped_harness(fast_control()).await;
    h.gateway.set_start(Err(ClientError::Gateway {
        message: "Insufficient balance".to_string(),
        status: Some(400),
    }));

    let err = h.facade.start_bot(&scenario_config()).await.unwrap_err();

    assert_eq!(err.to_string(), "Insufficient balance");
    assert_eq!(err.status_code(), Some(400));
    assert_eq!(h.board.snapshot().state, ControlState::error("Insufficient balance"));
}

#[tokio::test]
async fn unconfirmed_start_becomes_error_after_three_fetches() {
    let h = stopped_harness(fast_control()).await;
    h.gateway.set_status_fallback(Ok(stopped("2024-01-01T00:00:05Z")));

    let err = h.facade.start_bot(&scenario_config()).await.unwrap_err();

    assert_eq!(err.to_string(), "bot did not confirm start");
    // one initial refresh plus three confirmation fetches
    assert_eq!(h.gateway.status_calls(), 4);
    let snapshot = h.board.snapshot();
    assert!(!snapshot.busy);
    assert_eq!(snapshot.state, ControlState::error("bot did not confirm start"));
}

#[tokio::test]
async fn start_while_running_is_conflict() {
    let h = harness(Some("abc123"), fast_control());
    h.gateway.push_status(Ok(running("2024-01-01T00:00:00Z")));
    assert_ok!(h.facade.refresh().await);

    let err = h.facade.start_bot(&scenario_config()).await.unwrap_err();

    assert!(matches!(err, ClientError::StateConflict(_)));
    assert!(err.to_string().contains("stop the bot first"));
    assert_eq!(h.gateway.start_calls(), 0);
}

#[tokio::test]
async fn start_before_first_status_is_conflict() {
    let h = harness(Some("abc123"), fast_control());

    let err = h.facade.start_bot(&scenario_config()).await.unwrap_err();

    assert!(matches!(err, ClientError::StateConflict(_)));
    assert_eq!(h.gateway.start_calls(), 0);
}

#[tokio::test]
async fn stop_is_rejected_when_stopped() {
    let h = stopped_harness(fast_control()).await;

    let err = h.facade.stop_bot().await.unwrap_err();

    assert!(matches!(err, ClientError::StateConflict(_)));
    assert_eq!(h.gateway.stop_calls(), 0);
    assert_eq!(h.board.snapshot().state, ControlState::Stopped);
}

#[tokio::test]
async fn stop_reaches_stopped() {
    let h = harness(Some("abc123"), fast_control());
    h.gateway.push_status(Ok(running("2024-01-01T00:00:00Z")));
    assert_ok!(h.facade.refresh().await);
    h.gateway.set_status_fallback(Ok(stopped("2024-01-01T00:00:05Z")));

    let status = assert_ok!(h.facade.stop_bot().await);

    assert_eq!(status.state, BotState::Stopped);
    assert_eq!(h.gateway.stop_calls(), 1);
    assert_eq!(h.board.snapshot().state, ControlState::Stopped);
}

#[tokio::test]
async fn error_state_allows_start_and_stop() {
    let h = harness(Some("abc123"), fast_control());
    h.gateway.push_status(Ok(status(serde_json::json!({
        "status": "error",
        "error_message": "exchange rejected order",
        "timestamp": "2024-01-01T00:00:00Z"
    }))));
    assert_ok!(h.facade.refresh().await);
    assert_eq!(h.board.snapshot().state, ControlState::error("exchange rejected order"));
    assert!(h.board.snapshot().can_start());
    assert!(h.board.snapshot().can_stop());

    h.gateway.set_status_fallback(Ok(running("2024-01-01T00:00:05Z")));
    assert_ok!(h.facade.start_bot(&scenario_config()).await);

    assert_eq!(h.board.snapshot().state, ControlState::Running);
}

#[tokio::test]
async fn confirmation_sees_bot_error() {
    let h = stopped_harness(fast_control()).await;
    h.gateway.set_status_fallback(Ok(status(serde_json::json!({
        "status": "error",
        "error_message": "invalid API key",
        "timestamp": "2024-01-01T00:00:05Z"
    }))));

    let err = h.facade.start_bot(&scenario_config()).await.unwrap_err();

    assert_eq!(err.to_string(), "invalid API key");
    assert_eq!(h.gateway.status_calls(), 2);
}

#[tokio::test]
async fn abandoned_start_releases_busy_flag() {
    let h = stopped_harness(fast_control()).await;
    h.gateway.set_control_delay(Duration::from_millis(300));

    let outcome = tokio::time::timeout(
        Duration::from_millis(30),
        h.facade.start_bot(&scenario_config()),
    )
    .await;

    assert!(outcome.is_err());
    let snapshot = h.board.snapshot();
    assert!(!snapshot.busy);
    assert_eq!(snapshot.state, ControlState::error("bot action interrupted"));
}

#[tokio::test]
async fn clearing_wallet_mid_start_returns_to_idle() {
    let h = stopped_harness(fast_control()).await;
    h.gateway.set_control_delay(Duration::from_millis(100));
    h.gateway.set_status_fallback(Ok(running("2024-01-01T00:00:05Z")));

    let config = scenario_config();
    let (result, ()) = tokio::join!(h.facade.start_bot(&config), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.session.clear().unwrap();
        h.board.end_session();
    });

    assert!(matches!(result, Err(ClientError::StateConflict(_))));
    let snapshot = h.board.snapshot();
    assert_eq!(snapshot.state, ControlState::Idle);
    assert!(!snapshot.busy);
}
