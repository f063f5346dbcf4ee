/*
[INPUT]:  DashboardConfig or an injected gateway + SessionStore
[OUTPUT]: One context object owning session, status board, facade and background refresh
[POS]:    Session layer - entry point for the CLI and any other front end
[UPDATE]: When adding dashboard operations or background tasks
*/

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tradedash_gateway::{
    BacktestReport, BacktestRequest, GatewayClient, OrderAck, OrderRecord, OrderRequest, OrderSide,
    Strategy, TradingPair, WalletBalance, WalletConnectRequest,
};
use tracing::{info, warn};

use crate::bot_config::BotConfig;
use crate::config::DashboardConfig;
use crate::control::{BotControlFacade, ControlSettings};
use crate::demo::{DEMO_WALLET_ID, DataSource, DemoGateway};
use crate::error::ClientError;
use crate::gateway::{BotGateway, StrategyGateway, WalletGateway, with_deadline};
use crate::poller::{BotStatusPoller, PollerHandle, PollerSettings};
use crate::portfolio::{DEFAULT_PORTFOLIO_INTERVAL, PortfolioRefresher, PortfolioSnapshot};
use crate::session::{SessionStore, WalletId};
use crate::state::{SessionSnapshot, StatusBoard};
use crate::status::BotStatus;

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub control: ControlSettings,
    pub poller: PollerSettings,
    pub portfolio_interval: Duration,
    pub data_timeout: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            control: ControlSettings::default(),
            poller: PollerSettings::default(),
            portfolio_interval: DEFAULT_PORTFOLIO_INTERVAL,
            data_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&DashboardConfig> for DashboardSettings {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            control: config.control_settings(),
            poller: config.poller_settings(),
            portfolio_interval: config.portfolio_interval(),
            data_timeout: config.data_timeout(),
        }
    }
}

/// Backtest inputs before they are sent
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestParams {
    pub strategy: String,
    pub symbol: TradingPair,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: Decimal,
}

/// Explicit context object for one dashboard client
pub struct Dashboard {
    session: Arc<SessionStore>,
    board: Arc<StatusBoard>,
    facade: BotControlFacade,
    bot: Arc<dyn BotGateway>,
    wallets: Arc<dyn WalletGateway>,
    strategies: Arc<dyn StrategyGateway>,
    portfolio: Arc<PortfolioRefresher>,
    settings: DashboardSettings,
    background: Mutex<Vec<PollerHandle>>,
}

impl Dashboard {
    pub fn new<G>(gateway: Arc<G>, session: Arc<SessionStore>, settings: DashboardSettings) -> Self
    where
        G: BotGateway + WalletGateway + StrategyGateway + 'static,
    {
        let source = gateway.source();
        let board = Arc::new(StatusBoard::new(source));
        let bot: Arc<dyn BotGateway> = gateway.clone();
        let wallets: Arc<dyn WalletGateway> = gateway.clone();
        let strategies: Arc<dyn StrategyGateway> = gateway;

        let facade = BotControlFacade::new(
            bot.clone(),
            session.clone(),
            board.clone(),
            settings.control.clone(),
        );
        let portfolio = Arc::new(PortfolioRefresher::new(
            wallets.clone(),
            source,
            settings.data_timeout,
        ));

        Self {
            session,
            board,
            facade,
            bot,
            wallets,
            strategies,
            portfolio,
            settings,
            background: Mutex::new(Vec::new()),
        }
    }

    /// Build the live or demo client described by `config`.
    ///
    /// Demo mode keeps its session in memory so it never touches the live
    /// session file.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, ClientError> {
        let settings = DashboardSettings::from(config);
        match config.data_source {
            DataSource::Demo => {
                let session = SessionStore::in_memory(Some(WalletId::new(DEMO_WALLET_ID)?));
                info!("demo mode: using simulated backend");
                Ok(Self::new(Arc::new(DemoGateway::new()), Arc::new(session), settings))
            }
            DataSource::Live => {
                let path = config
                    .session
                    .path
                    .clone()
                    .or_else(SessionStore::default_path)
                    .ok_or_else(|| ClientError::Storage("no data directory for the session file".to_string()))?;
                let session = SessionStore::open(path)?;
                let client = GatewayClient::with_config(config.client_config())
                    .map_err(|err| ClientError::validation(err.to_string()))?;
                Ok(Self::new(Arc::new(client), Arc::new(session), settings))
            }
        }
    }

    pub fn source(&self) -> DataSource {
        self.bot.source()
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn wallet(&self) -> Option<WalletId> {
        self.session.get()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.board.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.board.subscribe()
    }

    pub fn portfolio(&self) -> &Arc<PortfolioRefresher> {
        &self.portfolio
    }

    fn require_wallet(&self) -> Result<WalletId, ClientError> {
        self.session
            .get()
            .ok_or_else(|| ClientError::validation("connect a wallet first"))
    }

    /// Exchange API credentials for a wallet session, then fetch the bot status once.
    pub async fn connect_wallet(
        &self,
        api_key: &str,
        api_secret: &str,
        use_testnet: bool,
    ) -> Result<WalletId, ClientError> {
        if api_key.trim().is_empty() || api_secret.trim().is_empty() {
            return Err(ClientError::validation("API key and secret are required"));
        }

        let request = WalletConnectRequest {
            api_key: api_key.trim().to_string(),
            api_secret: api_secret.trim().to_string(),
            use_testnet,
        };
        let response = with_deadline(
            self.settings.control.control_timeout,
            self.wallets.connect_wallet(&request),
        )
        .await?;
        let wallet = WalletId::new(&response.wallet_id).map_err(|_| ClientError::Transport {
            message: "backend returned an empty wallet id".to_string(),
            status: None,
        })?;

        self.stop_background();
        self.portfolio.clear();
        self.session.set(wallet.clone())?;
        self.board.begin_session();
        info!(wallet_id = %wallet, testnet = use_testnet, "wallet connected");

        self.initial_fetch().await;
        Ok(wallet)
    }

    /// Pick up a persisted wallet session, if any
    pub async fn resume(&self) -> Option<WalletId> {
        let wallet = self.session.get()?;
        self.board.begin_session();
        info!(wallet_id = %wallet, "resuming wallet session");
        self.initial_fetch().await;
        Some(wallet)
    }

    async fn initial_fetch(&self) {
        // Failure is already on the board; the poller or a manual refresh retries
        if let Err(err) = self.facade.refresh().await {
            warn!(error = %err, "initial bot status fetch failed");
        }
    }

    /// Start the status poller and the portfolio refresher for the current wallet
    pub fn start_background(&self) -> Result<(), ClientError> {
        self.stop_background();
        let poller = BotStatusPoller::spawn(
            self.bot.clone(),
            &self.session,
            self.board.clone(),
            self.settings.poller.clone(),
        )?;
        let refresher = self
            .portfolio
            .spawn(&self.session, self.settings.portfolio_interval)?;

        let mut background = self.lock_background();
        background.push(poller);
        background.push(refresher);
        Ok(())
    }

    pub fn stop_background(&self) {
        let handles: Vec<PollerHandle> = self.lock_background().drain(..).collect();
        for handle in &handles {
            handle.stop();
        }
    }

    pub fn background_running(&self) -> bool {
        self.lock_background().iter().any(PollerHandle::is_running)
    }

    fn lock_background(&self) -> std::sync::MutexGuard<'_, Vec<PollerHandle>> {
        self.background
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Forget the wallet; everything returns to `Idle`
    pub fn disconnect(&self) -> Result<(), ClientError> {
        self.stop_background();
        self.session.clear()?;
        self.board.end_session();
        self.portfolio.clear();
        info!("wallet disconnected");
        Ok(())
    }

    pub async fn start_bot(&self, config: &BotConfig) -> Result<BotStatus, ClientError> {
        self.facade.start_bot(config).await
    }

    pub async fn stop_bot(&self) -> Result<BotStatus, ClientError> {
        self.facade.stop_bot().await
    }

    pub async fn refresh_status(&self) -> Result<BotStatus, ClientError> {
        self.facade.refresh().await
    }

    pub async fn refresh_portfolio(&self) -> Result<PortfolioSnapshot, ClientError> {
        let wallet = self.require_wallet()?;
        self.portfolio.refresh_now(&wallet).await
    }

    pub async fn place_order(
        &self,
        side: OrderSide,
        symbol: TradingPair,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Result<OrderAck, ClientError> {
        let wallet = self.require_wallet()?;
        if quantity <= Decimal::ZERO {
            return Err(ClientError::validation("quantity must be greater than zero"));
        }
        if price.is_some_and(|price| price <= Decimal::ZERO) {
            return Err(ClientError::validation("price must be greater than zero"));
        }

        let request = OrderRequest {
            symbol,
            quantity,
            wallet_id: wallet.as_str().to_string(),
            price,
        };
        let ack = with_deadline(
            self.settings.control.control_timeout,
            self.wallets.place_order(side, &request),
        )
        .await?;
        info!(order_id = %ack.order_id, %side, %symbol, %quantity, "order placed");
        Ok(ack)
    }

    pub async fn orders(&self, symbol: Option<TradingPair>) -> Result<Vec<OrderRecord>, ClientError> {
        let wallet = self.require_wallet()?;
        let symbol = symbol.map(|symbol| symbol.as_str());
        let list = with_deadline(
            self.settings.data_timeout,
            self.wallets.list_orders(wallet.as_str(), symbol),
        )
        .await?;
        Ok(list.orders)
    }

    pub async fn balances(&self) -> Result<Vec<WalletBalance>, ClientError> {
        let wallet = self.require_wallet()?;
        let response = with_deadline(
            self.settings.data_timeout,
            self.wallets.wallet_balance(wallet.as_str()),
        )
        .await?;
        Ok(response.balances)
    }

    pub async fn strategies(&self) -> Result<Vec<Strategy>, ClientError> {
        with_deadline(self.settings.data_timeout, self.strategies.list_strategies()).await
    }

    pub async fn strategy(&self, id: &str) -> Result<Strategy, ClientError> {
        let id = require_id(id)?;
        with_deadline(self.settings.data_timeout, self.strategies.get_strategy(id)).await
    }

    pub async fn create_strategy(&self, strategy: &Strategy) -> Result<Strategy, ClientError> {
        if strategy.name.trim().is_empty() {
            return Err(ClientError::validation("strategy name is required"));
        }
        with_deadline(
            self.settings.data_timeout,
            self.strategies.create_strategy(strategy),
        )
        .await
    }

    pub async fn update_strategy(&self, id: &str, strategy: &Strategy) -> Result<Strategy, ClientError> {
        let id = require_id(id)?;
        with_deadline(
            self.settings.data_timeout,
            self.strategies.update_strategy(id, strategy),
        )
        .await
    }

    pub async fn delete_strategy(&self, id: &str) -> Result<(), ClientError> {
        let id = require_id(id)?;
        with_deadline(self.settings.data_timeout, self.strategies.delete_strategy(id)).await
    }

    /// Returns the updated strategy when the backend echoes it
    pub async fn toggle_strategy(&self, id: &str, active: bool) -> Result<Option<Strategy>, ClientError> {
        let id = require_id(id)?;
        let envelope = with_deadline(
            self.settings.data_timeout,
            self.strategies.toggle_strategy(id, active),
        )
        .await?;
        Ok(envelope.strategy)
    }

    pub async fn strategy_types(&self) -> Result<Vec<String>, ClientError> {
        let response = with_deadline(self.settings.data_timeout, self.strategies.strategy_types()).await?;
        Ok(response.names())
    }

    pub async fn backtest(&self, params: &BacktestParams) -> Result<BacktestReport, ClientError> {
        if params.strategy.trim().is_empty() {
            return Err(ClientError::validation("strategy is required"));
        }
        if params.end_date < params.start_date {
            return Err(ClientError::validation("end date must not be before start date"));
        }
        if params.initial_capital <= Decimal::ZERO {
            return Err(ClientError::validation("initial capital must be greater than zero"));
        }

        let request = BacktestRequest {
            strategy: params.strategy.trim().to_string(),
            symbol: params.symbol.to_string(),
            start_date: params.start_date.format("%Y-%m-%d").to_string(),
            end_date: params.end_date.format("%Y-%m-%d").to_string(),
            initial_capital: params.initial_capital,
        };
        // Backtests run server-side and can take a while
        with_deadline(
            self.settings.control.control_timeout,
            self.strategies.run_backtest(&request),
        )
        .await
    }

    pub async fn health(&self) -> Result<String, ClientError> {
        let response = with_deadline(self.settings.data_timeout, self.strategies.health()).await?;
        Ok(response.status)
    }

    /// Stop background tasks and wait for them to exit
    pub async fn shutdown(&self) {
        let handles: Vec<PollerHandle> = self.lock_background().drain(..).collect();
        for handle in handles {
            handle.join().await;
        }
    }
}

fn require_id(id: &str) -> Result<&str, ClientError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ClientError::validation("strategy id is required"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ControlState;

    fn demo() -> Dashboard {
        let mut config = DashboardConfig::default();
        config.data_source = DataSource::Demo;
        config.polling.confirm_delay_ms = 1;
        Dashboard::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn demo_mode_is_tagged_and_connected() {
        let dashboard = demo();

        assert_eq!(dashboard.source(), DataSource::Demo);
        assert_eq!(dashboard.wallet().unwrap().as_str(), DEMO_WALLET_ID);

        dashboard.resume().await;
        let snapshot = dashboard.snapshot();
        assert_eq!(snapshot.source, DataSource::Demo);
        assert_eq!(snapshot.state, ControlState::Stopped);
    }

    #[tokio::test]
    async fn connect_rejects_blank_credentials() {
        let dashboard = demo();
        let err = dashboard.connect_wallet("key", "  ", false).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn disconnect_returns_to_idle() {
        let dashboard = demo();
        dashboard.resume().await;
        dashboard.start_background().unwrap();

        dashboard.disconnect().unwrap();

        assert!(dashboard.wallet().is_none());
        assert_eq!(dashboard.snapshot().state, ControlState::Idle);
        assert!(!dashboard.background_running());
    }

    #[tokio::test]
    async fn order_validation_runs_before_any_request() {
        let dashboard = demo();

        let err = dashboard
            .place_order(OrderSide::Buy, TradingPair::BtcUsdt, Decimal::ZERO, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "quantity must be greater than zero");

        dashboard.disconnect().unwrap();
        let err = dashboard
            .place_order(OrderSide::Buy, TradingPair::BtcUsdt, Decimal::ONE, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connect a wallet first");
    }

    #[tokio::test]
    async fn backtest_rejects_reversed_dates() {
        let dashboard = demo();
        let params = BacktestParams {
            strategy: "grid".to_string(),
            symbol: TradingPair::EthUsdt,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            initial_capital: Decimal::from(1000),
        };

        assert!(matches!(
            dashboard.backtest(&params).await,
            Err(ClientError::Validation(_))
        ));
    }
}
