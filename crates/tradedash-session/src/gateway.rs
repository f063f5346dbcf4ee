/*
[INPUT]:  Session-layer calls to the trading backend
[OUTPUT]: Backend results mapped to ClientError
[POS]:    Integration seam - traits the facade, poller and dashboard talk through
[UPDATE]: When the session layer needs new backend operations
*/

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tradedash_gateway::{
    BacktestReport, BacktestRequest, BalanceResponse, BotStartRequest, BotStatusResponse,
    ControlResponse, GatewayClient, HealthResponse, OrderAck, OrderList, OrderRequest, OrderSide,
    Strategy, StrategyEnvelope, StrategyTypesResponse, WalletConnectRequest, WalletConnectResponse,
};

use crate::demo::DataSource;
use crate::error::ClientError;

/// Bot lifecycle calls
#[async_trait]
pub trait BotGateway: Send + Sync {
    fn source(&self) -> DataSource;

    async fn bot_status(&self) -> Result<BotStatusResponse, ClientError>;

    async fn start_bot(&self, request: &BotStartRequest) -> Result<ControlResponse, ClientError>;

    async fn stop_bot(&self) -> Result<ControlResponse, ClientError>;
}

/// Wallet session, balances and orders
#[async_trait]
pub trait WalletGateway: Send + Sync {
    async fn connect_wallet(
        &self,
        request: &WalletConnectRequest,
    ) -> Result<WalletConnectResponse, ClientError>;

    async fn wallet_balance(&self, wallet_id: &str) -> Result<BalanceResponse, ClientError>;

    async fn list_orders(&self, wallet_id: &str, symbol: Option<&str>) -> Result<OrderList, ClientError>;

    async fn place_order(&self, side: OrderSide, request: &OrderRequest) -> Result<OrderAck, ClientError>;
}

/// Strategy catalogue, backtests and health
#[async_trait]
pub trait StrategyGateway: Send + Sync {
    async fn list_strategies(&self) -> Result<Vec<Strategy>, ClientError>;

    async fn get_strategy(&self, id: &str) -> Result<Strategy, ClientError>;

    async fn create_strategy(&self, strategy: &Strategy) -> Result<Strategy, ClientError>;

    async fn update_strategy(&self, id: &str, strategy: &Strategy) -> Result<Strategy, ClientError>;

    async fn delete_strategy(&self, id: &str) -> Result<(), ClientError>;

    async fn toggle_strategy(&self, id: &str, active: bool) -> Result<StrategyEnvelope, ClientError>;

    async fn strategy_types(&self) -> Result<StrategyTypesResponse, ClientError>;

    async fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestReport, ClientError>;

    async fn health(&self) -> Result<HealthResponse, ClientError>;
}

/// Bound a backend call; expiry is a transport failure
pub async fn with_deadline<T, F>(limit: Duration, call: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::timed_out(limit)),
    }
}

#[async_trait]
impl BotGateway for GatewayClient {
    fn source(&self) -> DataSource {
        DataSource::Live
    }

    async fn bot_status(&self) -> Result<BotStatusResponse, ClientError> {
        Ok(GatewayClient::bot_status(self).await?)
    }

    async fn start_bot(&self, request: &BotStartRequest) -> Result<ControlResponse, ClientError> {
        Ok(GatewayClient::start_bot(self, request).await?)
    }

    async fn stop_bot(&self) -> Result<ControlResponse, ClientError> {
        Ok(GatewayClient::stop_bot(self).await?)
    }
}

#[async_trait]
impl WalletGateway for GatewayClient {
    async fn connect_wallet(
        &self,
        request: &WalletConnectRequest,
    ) -> Result<WalletConnectResponse, ClientError> {
        Ok(GatewayClient::connect_wallet(self, request).await?)
    }

    async fn wallet_balance(&self, wallet_id: &str) -> Result<BalanceResponse, ClientError> {
        Ok(GatewayClient::wallet_balance(self, wallet_id).await?)
    }

    async fn list_orders(&self, wallet_id: &str, symbol: Option<&str>) -> Result<OrderList, ClientError> {
        Ok(GatewayClient::list_orders(self, wallet_id, symbol).await?)
    }

    async fn place_order(&self, side: OrderSide, request: &OrderRequest) -> Result<OrderAck, ClientError> {
        Ok(GatewayClient::place_order(self, side, request).await?)
    }
}

#[async_trait]
impl StrategyGateway for GatewayClient {
    async fn list_strategies(&self) -> Result<Vec<Strategy>, ClientError> {
        Ok(GatewayClient::list_strategies(self).await?)
    }

    async fn get_strategy(&self, id: &str) -> Result<Strategy, ClientError> {
        Ok(GatewayClient::get_strategy(self, id).await?)
    }

    async fn create_strategy(&self, strategy: &Strategy) -> Result<Strategy, ClientError> {
        Ok(GatewayClient::create_strategy(self, strategy).await?)
    }

    async fn update_strategy(&self, id: &str, strategy: &Strategy) -> Result<Strategy, ClientError> {
        Ok(GatewayClient::update_strategy(self, id, strategy).await?)
    }

    async fn delete_strategy(&self, id: &str) -> Result<(), ClientError> {
        Ok(GatewayClient::delete_strategy(self, id).await?)
    }

    async fn toggle_strategy(&self, id: &str, active: bool) -> Result<StrategyEnvelope, ClientError> {
        Ok(GatewayClient::toggle_strategy(self, id, active).await?)
    }

    async fn strategy_types(&self) -> Result<StrategyTypesResponse, ClientError> {
        Ok(GatewayClient::strategy_types(self).await?)
    }

    async fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestReport, ClientError> {
        Ok(GatewayClient::run_backtest(self, request).await?)
    }

    async fn health(&self) -> Result<HealthResponse, ClientError> {
        Ok(GatewayClient::health(self).await?)
    }
}
