/*
[INPUT]:  BotGateway, SessionStore wallet changes, StatusBoard, CancellationToken
[OUTPUT]: Background task polling bot status on a fixed interval
[POS]:    Execution layer - periodic refresh loops and their handles
[UPDATE]: When changing tick, skip or cancellation semantics
*/

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::gateway::{BotGateway, with_deadline};
use crate::session::{SessionStore, WalletId};
use crate::state::{Applied, StatusBoard};
use crate::status::BotStatus;

pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub interval: Duration,
    pub status_timeout: Duration,
    /// Consecutive failures before the state reads as connection lost
    pub failure_threshold: u32,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_STATUS_INTERVAL,
            status_timeout: Duration::from_secs(5),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// Handle to a running periodic task.
///
/// Dropping the handle stops the task; a stopped task cannot be restarted.
#[derive(Debug)]
pub struct PollerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
    skipped: Arc<AtomicU64>,
}

impl PollerHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Ticks dropped because the previous fetch was still in flight
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Stop and wait for the loop to exit
    pub async fn join(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Run `tick` every `interval` for as long as the current wallet stays connected.
///
/// A tick that fires while the previous one is still running is skipped, not
/// queued. Exit aborts the in-flight tick.
pub(crate) fn spawn_periodic<F, Fut>(
    name: &'static str,
    session: &SessionStore,
    interval: Duration,
    tick: F,
) -> Result<PollerHandle, ClientError>
where
    F: Fn(WalletId) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut wallet_rx = session.subscribe();
    let active = wallet_rx
        .borrow_and_update()
        .clone()
        .ok_or_else(|| ClientError::validation("connect a wallet first"))?;

    let token = CancellationToken::new();
    let skipped = Arc::new(AtomicU64::new(0));
    let loop_token = token.clone();
    let loop_skipped = skipped.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<()>> = None;
        info!(task = name, wallet_id = %active, ?interval, "periodic refresh started");

        loop {
            tokio::select! {
                biased;
                _ = loop_token.cancelled() => {
                    debug!(task = name, "periodic refresh cancelled");
                    break;
                }
                changed = wallet_rx.changed() => {
                    let same_wallet = changed.is_ok()
                        && wallet_rx.borrow_and_update().as_ref() == Some(&active);
                    if !same_wallet {
                        info!(task = name, wallet_id = %active, "wallet session ended; refresh stopped");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if in_flight.as_ref().is_some_and(|task| !task.is_finished()) {
                        let total = loop_skipped.fetch_add(1, Ordering::Relaxed) + 1;
                        debug!(task = name, skipped = total, "previous tick still running; tick skipped");
                        continue;
                    }
                    in_flight = Some(tokio::spawn(tick(active.clone())));
                }
            }
        }

        if let Some(task) = in_flight {
            task.abort();
        }
    });

    Ok(PollerHandle {
        token,
        task: Some(task),
        skipped,
    })
}

/// Fetch the bot status once and offer it to the board.
///
/// Failures are counted on the board and returned; they never panic.
pub(crate) async fn poll_once(
    gateway: &dyn BotGateway,
    board: &StatusBoard,
    epoch: u64,
    settings: &PollerSettings,
) -> Result<(Applied, BotStatus), ClientError> {
    match with_deadline(settings.status_timeout, gateway.bot_status()).await {
        Ok(response) => {
            let status = BotStatus::from_response(response);
            let applied = board.apply_fetched(epoch, status.clone());
            Ok((applied, status))
        }
        Err(err) => {
            board.record_failure(epoch, &err.to_string(), settings.failure_threshold);
            Err(err)
        }
    }
}

/// Periodic bot status fetcher for the active wallet session
pub struct BotStatusPoller;

impl BotStatusPoller {
    /// Start polling; fails with `Validation` when no wallet is connected.
    pub fn spawn(
        gateway: Arc<dyn BotGateway>,
        session: &SessionStore,
        board: Arc<StatusBoard>,
        settings: PollerSettings,
    ) -> Result<PollerHandle, ClientError> {
        let epoch = board.epoch();
        let interval = settings.interval;
        let settings = Arc::new(settings);

        spawn_periodic("bot-status", session, interval, move |_wallet| {
            let gateway = gateway.clone();
            let board = board.clone();
            let settings = settings.clone();
            async move {
                // Failures are already recorded on the board
                let _ = poll_once(gateway.as_ref(), &board, epoch, &settings).await;
            }
        })
    }
}
