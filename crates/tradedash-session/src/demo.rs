/*
[INPUT]:  Gateway calls made while demo mode is enabled
[OUTPUT]: Simulated backend responses, tagged as demo data
[POS]:    Integration layer - opt-in offline backend
[UPDATE]: When the gateway traits gain operations
*/

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use tradedash_gateway::{
    BacktestReport, BacktestRequest, BalanceResponse, BotStartRequest, BotStatusResponse,
    ControlResponse, HealthResponse, OrderAck, OrderList, OrderRecord, OrderRequest, OrderSide,
    RiskSettings, RunningConfig, Strategy, StrategyEnvelope, StrategyTypesResponse, TradingPair,
    WalletBalance, WalletConnectRequest, WalletConnectResponse,
};
use tracing::info;

use crate::error::ClientError;
use crate::gateway::{BotGateway, StrategyGateway, WalletGateway};

pub const DEMO_WALLET_ID: &str = "demo-wallet";

/// Where displayed data comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Live,
    Demo,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Live => f.write_str("live"),
            DataSource::Demo => f.write_str("demo"),
        }
    }
}

#[derive(Debug)]
struct DemoState {
    running: Option<RunningConfig>,
    started_at: Option<DateTime<Utc>>,
    ticks: u64,
    orders: Vec<OrderRecord>,
    strategies: Vec<Strategy>,
    next_id: u64,
}

/// In-process simulated backend
#[derive(Debug)]
pub struct DemoGateway {
    state: Mutex<DemoState>,
}

impl Default for DemoGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DemoState {
                running: None,
                started_at: None,
                ticks: 0,
                orders: Vec::new(),
                strategies: seed_strategies(),
                next_id: 3,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DemoState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn rejected(message: &str) -> ClientError {
    ClientError::Gateway {
        message: message.to_string(),
        status: Some(400),
    }
}

fn base_price(symbol: &str) -> Decimal {
    match symbol {
        "BTCUSDT" => Decimal::from(43_250),
        "ETHUSDT" => Decimal::from(2_280),
        "BNBUSDT" => Decimal::from(310),
        "ADAUSDT" => Decimal::new(52, 2),
        "DOGEUSDT" => Decimal::new(85, 3),
        _ => Decimal::ONE,
    }
}

/// Deterministic drift of up to +/-0.3 % around the base price
fn simulated_price(symbol: &str, tick: u64) -> Decimal {
    let step = Decimal::from((tick % 7) as i64 - 3);
    let drift = Decimal::ONE + step / Decimal::from(1000);
    (base_price(symbol) * drift).round_dp(4)
}

fn seed_strategies() -> Vec<Strategy> {
    let mut sma = BTreeMap::new();
    sma.insert("fast".to_string(), serde_json::json!(9));
    sma.insert("slow".to_string(), serde_json::json!(21));

    vec![
        Strategy {
            id: Some("1".to_string()),
            name: "BTC trend".to_string(),
            strategy_type: "sma_crossover".to_string(),
            description: "Moving average crossover on BTC".to_string(),
            pair: TradingPair::BtcUsdt.to_string(),
            timeframes: vec!["1h".to_string(), "4h".to_string()],
            parameters: sma,
            risk_settings: Some(RiskSettings {
                max_position_size: Decimal::from(10),
                stop_loss: Decimal::new(25, 1),
                take_profit: Decimal::from(5),
                trailing_stop: false,
                trailing_stop_percent: Decimal::ZERO,
            }),
            active: true,
        },
        Strategy {
            id: Some("2".to_string()),
            name: "ETH grid".to_string(),
            strategy_type: "grid".to_string(),
            description: String::new(),
            pair: TradingPair::EthUsdt.to_string(),
            timeframes: vec!["15m".to_string()],
            parameters: BTreeMap::new(),
            risk_settings: None,
            active: false,
        },
    ]
}

fn running_config(request: &BotStartRequest) -> RunningConfig {
    RunningConfig {
        symbol: request.symbol.to_string(),
        wallet_id: Some(request.wallet_id.clone()),
        max_amount: request.max_amount,
        interval_seconds: request.interval_seconds,
        strategy: request.strategy.to_string(),
        buy_threshold: request.buy_threshold,
        sell_threshold: request.sell_threshold,
    }
}

#[async_trait]
impl BotGateway for DemoGateway {
    fn source(&self) -> DataSource {
        DataSource::Demo
    }

    async fn bot_status(&self) -> Result<BotStatusResponse, ClientError> {
        let mut state = self.lock();
        state.ticks += 1;
        let ticks = state.ticks;
        let now = Utc::now().to_rfc3339();

        let Some(config) = state.running.clone() else {
            return Ok(BotStatusResponse {
                status: "stopped".to_string(),
                symbol: None,
                wallet_id: None,
                start_time: None,
                last_operation: None,
                error_message: None,
                config: None,
                timestamp: Some(now),
            });
        };

        let side = if ticks % 2 == 0 { "BUY" } else { "SELL" };
        let last_operation = format!(
            "{side} {} @ {}",
            config.symbol,
            simulated_price(&config.symbol, ticks)
        );
        Ok(BotStatusResponse {
            status: "running".to_string(),
            symbol: Some(config.symbol.clone()),
            wallet_id: config.wallet_id.clone(),
            start_time: state.started_at.map(|at| at.to_rfc3339()),
            last_operation: Some(last_operation),
            error_message: None,
            config: Some(config),
            timestamp: Some(now),
        })
    }

    async fn start_bot(&self, request: &BotStartRequest) -> Result<ControlResponse, ClientError> {
        let mut state = self.lock();
        if state.running.is_some() {
            return Err(rejected("Bot is already running"));
        }
        let config = running_config(request);
        state.running = Some(config.clone());
        state.started_at = Some(Utc::now());
        info!(symbol = %request.symbol, "demo bot started");
        Ok(ControlResponse {
            success: Some(true),
            message: Some("Bot started (demo)".to_string()),
            error: None,
            config: Some(config),
        })
    }

    async fn stop_bot(&self) -> Result<ControlResponse, ClientError> {
        let mut state = self.lock();
        if state.running.take().is_none() {
            return Err(rejected("Bot is not running"));
        }
        state.started_at = None;
        info!("demo bot stopped");
        Ok(ControlResponse {
            success: Some(true),
            message: Some("Bot stopped (demo)".to_string()),
            error: None,
            config: None,
        })
    }
}

#[async_trait]
impl WalletGateway for DemoGateway {
    async fn connect_wallet(
        &self,
        request: &WalletConnectRequest,
    ) -> Result<WalletConnectResponse, ClientError> {
        if request.api_key.trim().is_empty() || request.api_secret.trim().is_empty() {
            return Err(rejected("API key and secret are required"));
        }
        Ok(WalletConnectResponse {
            wallet_id: DEMO_WALLET_ID.to_string(),
            message: Some("Connected to demo wallet".to_string()),
        })
    }

    async fn wallet_balance(&self, _wallet_id: &str) -> Result<BalanceResponse, ClientError> {
        let balances = [
            ("BTC", Decimal::new(5, 2), Decimal::ZERO),
            ("ETH", Decimal::new(12, 1), Decimal::new(1, 1)),
            ("BNB", Decimal::from(3), Decimal::ZERO),
            ("USDT", Decimal::from(2_500), Decimal::from(150)),
        ]
        .into_iter()
        .map(|(asset, free, locked)| WalletBalance {
            asset: asset.to_string(),
            free,
            locked,
        })
        .collect();

        Ok(BalanceResponse {
            balances,
            timestamp: Some(Utc::now().to_rfc3339()),
        })
    }

    async fn list_orders(&self, _wallet_id: &str, symbol: Option<&str>) -> Result<OrderList, ClientError> {
        let state = self.lock();
        let orders: Vec<OrderRecord> = state
            .orders
            .iter()
            .rev()
            .filter(|order| symbol.is_none_or(|symbol| order.symbol == symbol))
            .cloned()
            .collect();
        Ok(OrderList {
            count: orders.len(),
            orders,
            timestamp: Some(Utc::now().to_rfc3339()),
        })
    }

    async fn place_order(&self, side: OrderSide, request: &OrderRequest) -> Result<OrderAck, ClientError> {
        let mut state = self.lock();
        state.next_id += 1;
        let order_id = format!("demo-{}", state.next_id);
        let symbol = request.symbol.to_string();
        let price = request
            .price
            .unwrap_or_else(|| simulated_price(&symbol, state.ticks));
        let now = Utc::now().to_rfc3339();

        state.orders.push(OrderRecord {
            order_id: order_id.clone(),
            symbol,
            side: side.to_string(),
            order_type: if request.price.is_some() { "LIMIT" } else { "MARKET" }.to_string(),
            status: "FILLED".to_string(),
            quantity: request.quantity,
            price: Some(price),
            executed_quantity: request.quantity,
            cumulative_quote_quantity: (request.quantity * price).round_dp(8),
            created_at: Some(now.clone()),
            updated_at: Some(now),
        });

        Ok(OrderAck {
            order_id,
            status: Some("FILLED".to_string()),
            extra: BTreeMap::new(),
        })
    }
}

#[async_trait]
impl StrategyGateway for DemoGateway {
    async fn list_strategies(&self) -> Result<Vec<Strategy>, ClientError> {
        Ok(self.lock().strategies.clone())
    }

    async fn get_strategy(&self, id: &str) -> Result<Strategy, ClientError> {
        self.lock()
            .strategies
            .iter()
            .find(|strategy| strategy.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| rejected("Strategy not found"))
    }

    async fn create_strategy(&self, strategy: &Strategy) -> Result<Strategy, ClientError> {
        let mut state = self.lock();
        state.next_id += 1;
        let mut created = strategy.clone();
        created.id = Some(state.next_id.to_string());
        state.strategies.push(created.clone());
        Ok(created)
    }

    async fn update_strategy(&self, id: &str, strategy: &Strategy) -> Result<Strategy, ClientError> {
        let mut state = self.lock();
        let slot = state
            .strategies
            .iter_mut()
            .find(|existing| existing.id.as_deref() == Some(id))
            .ok_or_else(|| rejected("Strategy not found"))?;
        *slot = Strategy {
            id: Some(id.to_string()),
            ..strategy.clone()
        };
        Ok(slot.clone())
    }

    async fn delete_strategy(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.lock();
        let before = state.strategies.len();
        state.strategies.retain(|strategy| strategy.id.as_deref() != Some(id));
        if state.strategies.len() == before {
            return Err(rejected("Strategy not found"));
        }
        Ok(())
    }

    async fn toggle_strategy(&self, id: &str, active: bool) -> Result<StrategyEnvelope, ClientError> {
        let mut state = self.lock();
        let strategy = state
            .strategies
            .iter_mut()
            .find(|strategy| strategy.id.as_deref() == Some(id))
            .ok_or_else(|| rejected("Strategy not found"))?;
        strategy.active = active;
        Ok(StrategyEnvelope {
            success: Some(true),
            strategy: Some(strategy.clone()),
            ..StrategyEnvelope::default()
        })
    }

    async fn strategy_types(&self) -> Result<StrategyTypesResponse, ClientError> {
        Ok(StrategyTypesResponse {
            success: Some(true),
            types: ["simple", "grid", "sma_crossover", "rsi_reversal"]
                .into_iter()
                .map(serde_json::Value::from)
                .collect(),
        })
    }

    async fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestReport, ClientError> {
        // Same inputs always give the same report
        let seed: u64 = [
            &request.strategy,
            &request.symbol,
            &request.start_date,
            &request.end_date,
        ]
        .iter()
        .flat_map(|part| part.bytes())
        .fold(17u64, |acc, byte| acc.wrapping_mul(31).wrapping_add(u64::from(byte)));

        let total_return = ((seed % 400) as f64 - 100.0) / 10.0;
        let initial = request.initial_capital.to_f64().unwrap_or(0.0);
        Ok(BacktestReport {
            total_return: Some(total_return),
            win_rate: Some(0.4 + (seed % 30) as f64 / 100.0),
            max_drawdown: Some((seed % 150) as f64 / 10.0),
            sharpe_ratio: Some(((seed % 250) as f64 - 50.0) / 100.0),
            total_trades: Some(10 + seed % 90),
            final_capital: Some(initial * (1.0 + total_return / 100.0)),
            extra: BTreeMap::new(),
        })
    }

    async fn health(&self) -> Result<HealthResponse, ClientError> {
        Ok(HealthResponse {
            status: "ok (demo)".to_string(),
        })
    }
}
