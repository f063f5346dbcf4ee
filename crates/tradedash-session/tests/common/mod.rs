/*
[INPUT]:  Scripted backend responses
[OUTPUT]: Fake gateway and status helpers for session tests
[POS]:    Integration test layer - shared fixtures
[UPDATE]: When gateway traits change
*/

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tradedash_gateway::{
    BalanceResponse, BotStartRequest, BotStatusResponse, ControlResponse, OrderAck, OrderList,
    OrderRequest, OrderSide, WalletConnectRequest, WalletConnectResponse,
};
use tradedash_session::{
    BotControlFacade, BotGateway, ClientError, ControlSettings, DataSource, SessionStore,
    StatusBoard, WalletGateway, WalletId,
};

pub type Scripted<T> = Result<T, ClientError>;

/// Fake backend whose answers are queued by the test
#[derive(Default)]
pub struct ScriptedGateway {
    statuses: Mutex<VecDeque<Scripted<BotStatusResponse>>>,
    status_fallback: Mutex<Option<Scripted<BotStatusResponse>>>,
    start_result: Mutex<Option<Scripted<ControlResponse>>>,
    stop_result: Mutex<Option<Scripted<ControlResponse>>>,
    balances: Mutex<VecDeque<Scripted<BalanceResponse>>>,
    orders: Mutex<VecDeque<Scripted<OrderList>>>,
    status_delay: Mutex<Duration>,
    control_delay: Mutex<Duration>,
    pub last_start: Mutex<Option<BotStartRequest>>,
    pub status_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer the next status fetch with `result`
    pub fn push_status(&self, result: Scripted<BotStatusResponse>) {
        self.statuses.lock().unwrap().push_back(result);
    }

    /// Answer every status fetch once the queue is empty
    pub fn set_status_fallback(&self, result: Scripted<BotStatusResponse>) {
        *self.status_fallback.lock().unwrap() = Some(result);
    }

    pub fn set_start(&self, result: Scripted<ControlResponse>) {
        *self.start_result.lock().unwrap() = Some(result);
    }

    pub fn set_stop(&self, result: Scripted<ControlResponse>) {
        *self.stop_result.lock().unwrap() = Some(result);
    }

    pub fn push_balances(&self, result: Scripted<BalanceResponse>) {
        self.balances.lock().unwrap().push_back(result);
    }

    pub fn push_orders(&self, result: Scripted<OrderList>) {
        self.orders.lock().unwrap().push_back(result);
    }

    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    pub fn set_control_delay(&self, delay: Duration) {
        *self.control_delay.lock().unwrap() = delay;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    fn control_ok() -> ControlResponse {
        ControlResponse {
            success: Some(true),
            ..ControlResponse::default()
        }
    }
}

#[async_trait]
impl BotGateway for ScriptedGateway {
    fn source(&self) -> DataSource {
        DataSource::Live
    }

    async fn bot_status(&self) -> Result<BotStatusResponse, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let queued = self.statuses.lock().unwrap().pop_front();
        match queued {
            Some(result) => result,
            None => self
                .status_fallback
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(transport("no scripted status"))),
        }
    }

    async fn start_bot(&self, request: &BotStartRequest) -> Result<ControlResponse, ClientError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_start.lock().unwrap() = Some(request.clone());
        let delay = *self.control_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.start_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Self::control_ok()))
    }

    async fn stop_bot(&self) -> Result<ControlResponse, ClientError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.control_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.stop_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Self::control_ok()))
    }
}

#[async_trait]
impl WalletGateway for ScriptedGateway {
    async fn connect_wallet(
        &self,
        _request: &WalletConnectRequest,
    ) -> Result<WalletConnectResponse, ClientError> {
        Ok(WalletConnectResponse {
            wallet_id: "abc123".to_string(),
            message: None,
        })
    }

    async fn wallet_balance(&self, _wallet_id: &str) -> Result<BalanceResponse, ClientError> {
        self.balances
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transport("no scripted balances")))
    }

    async fn list_orders(&self, _wallet_id: &str, _symbol: Option<&str>) -> Result<OrderList, ClientError> {
        self.orders
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transport("no scripted orders")))
    }

    async fn place_order(&self, _side: OrderSide, _request: &OrderRequest) -> Result<OrderAck, ClientError> {
        Err(transport("orders are not scripted"))
    }
}

pub fn transport(message: &str) -> ClientError {
    ClientError::Transport {
        message: message.to_string(),
        status: None,
    }
}

pub fn status(value: serde_json::Value) -> BotStatusResponse {
    serde_json::from_value(value).unwrap()
}

pub fn stopped(timestamp: &str) -> BotStatusResponse {
    status(serde_json::json!({ "status": "stopped", "timestamp": timestamp }))
}

pub fn running(timestamp: &str) -> BotStatusResponse {
    status(serde_json::json!({
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
        "timestamp": timestamp
    }))
}

pub fn wallet(id: &str) -> WalletId {
    WalletId::new(id).unwrap()
}

pub fn fast_control() -> ControlSettings {
    ControlSettings {
        status_timeout: Duration::from_millis(500),
        control_timeout: Duration::from_millis(500),
        confirm_attempts: 3,
        confirm_delay: Duration::from_millis(5),
        failure_threshold: 3,
    }
}

pub struct Harness {
    pub gateway: Arc<ScriptedGateway>,
    pub session: Arc<SessionStore>,
    pub board: Arc<StatusBoard>,
    pub facade: BotControlFacade,
}

/// Facade over a scripted gateway with an in-memory session
pub fn harness(wallet_id: Option<&str>, settings: ControlSettings) -> Harness {
    let gateway = ScriptedGateway::new();
    let session = Arc::new(SessionStore::in_memory(wallet_id.map(wallet)));
    let board = Arc::new(StatusBoard::new(DataSource::Live));
    board.begin_session();
    let facade = BotControlFacade::new(gateway.clone(), session.clone(), board.clone(), settings);
    Harness {
        gateway,
        session,
        board,
        facade,
    }
}
