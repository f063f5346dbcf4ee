/*
[INPUT]:  WalletGateway, active WalletId
[OUTPUT]: PortfolioSnapshot (balances + orders) published on a watch channel
[POS]:    Session layer - slow-cadence wallet data refresh
[UPDATE]: When balances or orders need different refresh rules
*/

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tradedash_gateway::{OrderRecord, WalletBalance, parse_server_time};
use tracing::{debug, warn};

use crate::demo::DataSource;
use crate::error::ClientError;
use crate::gateway::{WalletGateway, with_deadline};
use crate::poller::{PollerHandle, spawn_periodic};
use crate::session::{SessionStore, WalletId};

pub const DEFAULT_PORTFOLIO_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioSnapshot {
    pub wallet_id: Option<WalletId>,
    pub balances: Vec<WalletBalance>,
    /// Newest first
    pub orders: Vec<OrderRecord>,
    /// Server time of the balance payload
    pub balances_as_of: Option<DateTime<Utc>>,
    /// Local time of the last fully successful refresh
    pub refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub source: DataSource,
}

impl PortfolioSnapshot {
    pub fn balance(&self, asset: &str) -> Option<&WalletBalance> {
        self.balances
            .iter()
            .find(|balance| balance.asset.eq_ignore_ascii_case(asset))
    }
}

/// Balances and orders for the active wallet
pub struct PortfolioRefresher {
    gateway: Arc<dyn WalletGateway>,
    tx: watch::Sender<PortfolioSnapshot>,
    data_timeout: Duration,
    // Bumped by `clear`; refreshes started before a clear are dropped
    generation: AtomicU64,
}

impl PortfolioRefresher {
    pub fn new(gateway: Arc<dyn WalletGateway>, source: DataSource, data_timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(PortfolioSnapshot {
            source,
            ..PortfolioSnapshot::default()
        });
        Self {
            gateway,
            tx,
            data_timeout,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PortfolioSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        self.tx.borrow().clone()
    }

    /// Forget everything; used when the wallet session ends
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.tx.send_modify(|snapshot| {
            *snapshot = PortfolioSnapshot {
                source: snapshot.source,
                ..PortfolioSnapshot::default()
            };
        });
    }

    /// Fetch balances and orders together.
    ///
    /// A failed half keeps its previous data; the first failure is recorded
    /// in `last_error` and returned.
    pub async fn refresh_now(&self, wallet: &WalletId) -> Result<PortfolioSnapshot, ClientError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let (balances, orders) = tokio::join!(
            with_deadline(self.data_timeout, self.gateway.wallet_balance(wallet.as_str())),
            with_deadline(self.data_timeout, self.gateway.list_orders(wallet.as_str(), None)),
        );

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(wallet_id = %wallet, "portfolio refresh outlived its session; dropped");
            return Err(ClientError::conflict("wallet session changed during refresh"));
        }

        let mut failure: Option<ClientError> = None;
        self.tx.send_modify(|snapshot| {
            if snapshot.wallet_id.as_ref() != Some(wallet) {
                *snapshot = PortfolioSnapshot {
                    wallet_id: Some(wallet.clone()),
                    source: snapshot.source,
                    ..PortfolioSnapshot::default()
                };
            }

            match balances {
                Ok(response) => {
                    snapshot.balances_as_of = response.timestamp.as_deref().and_then(parse_server_time);
                    snapshot.balances = response.balances;
                }
                Err(err) => failure = Some(err),
            }
            match orders {
                Ok(list) => snapshot.orders = list.orders,
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }

            match &failure {
                Some(err) => snapshot.last_error = Some(err.to_string()),
                None => {
                    snapshot.last_error = None;
                    snapshot.refreshed_at = Some(Utc::now());
                }
            }
        });

        match failure {
            Some(err) => {
                warn!(wallet_id = %wallet, error = %err, "portfolio refresh failed");
                Err(err)
            }
            None => Ok(self.snapshot()),
        }
    }

    /// Refresh on `interval` while the current wallet stays connected
    pub fn spawn(
        self: &Arc<Self>,
        session: &SessionStore,
        interval: Duration,
    ) -> Result<PollerHandle, ClientError> {
        let refresher = Arc::clone(self);
        spawn_periodic("portfolio", session, interval, move |wallet| {
            let refresher = refresher.clone();
            async move {
                let _ = refresher.refresh_now(&wallet).await;
            }
        })
    }
}
