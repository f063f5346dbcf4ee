/*
[INPUT]:  BotConfig from the user, BotGateway, SessionStore, StatusBoard
[OUTPUT]: Serialized bot start/stop with confirmation, manual status refresh
[POS]:    Session layer - the only component that requests bot start or stop
[UPDATE]: When changing confirmation, busy or validation rules
*/

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::bot_config::BotConfig;
use crate::error::ClientError;
use crate::gateway::{BotGateway, with_deadline};
use crate::poller::{PollerSettings, poll_once};
use crate::session::{SessionStore, WalletId};
use crate::state::{Applied, BotAction, BusyGuard, ControlState, StatusBoard};
use crate::status::{BotState, BotStatus};

#[derive(Debug, Clone)]
pub struct ControlSettings {
    pub status_timeout: Duration,
    pub control_timeout: Duration,
    /// Status fetches allowed before an action counts as unconfirmed
    pub confirm_attempts: u32,
    pub confirm_delay: Duration,
    pub failure_threshold: u32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            status_timeout: Duration::from_secs(5),
            control_timeout: Duration::from_secs(15),
            confirm_attempts: 3,
            confirm_delay: Duration::from_secs(1),
            failure_threshold: 3,
        }
    }
}

impl ControlSettings {
    fn poll_settings(&self) -> PollerSettings {
        PollerSettings {
            status_timeout: self.status_timeout,
            failure_threshold: self.failure_threshold,
            ..PollerSettings::default()
        }
    }
}

/// Bot start/stop facade
pub struct BotControlFacade {
    gateway: Arc<dyn BotGateway>,
    session: Arc<SessionStore>,
    board: Arc<StatusBoard>,
    settings: ControlSettings,
}

impl BotControlFacade {
    pub fn new(
        gateway: Arc<dyn BotGateway>,
        session: Arc<SessionStore>,
        board: Arc<StatusBoard>,
        settings: ControlSettings,
    ) -> Self {
        Self {
            gateway,
            session,
            board,
            settings,
        }
    }

    pub fn board(&self) -> &Arc<StatusBoard> {
        &self.board
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    fn require_wallet(&self) -> Result<WalletId, ClientError> {
        self.session
            .get()
            .ok_or_else(|| ClientError::validation("connect a wallet first"))
    }

    /// Start the bot and wait until the backend reports it running.
    pub async fn start_bot(&self, config: &BotConfig) -> Result<BotStatus, ClientError> {
        let wallet = self.require_wallet()?;
        config.validate()?;

        let guard = self.board.try_begin(BotAction::Start)?;
        let request = config.to_request(&wallet);
        info!(
            wallet_id = %wallet,
            symbol = %config.symbol,
            strategy = %config.strategy,
            "starting bot"
        );

        let started = with_deadline(self.settings.control_timeout, self.gateway.start_bot(&request)).await;
        if let Err(err) = started {
            warn!(error = %err, "bot start failed");
            guard.fail(&err);
            return Err(err);
        }

        self.confirm(guard, BotState::Running, "bot did not confirm start")
            .await
    }

    /// Stop the bot and wait until the backend reports it stopped.
    pub async fn stop_bot(&self) -> Result<BotStatus, ClientError> {
        let wallet = self.require_wallet()?;
        let guard = self.board.try_begin(BotAction::Stop)?;
        info!(wallet_id = %wallet, "stopping bot");

        let stopped = with_deadline(self.settings.control_timeout, self.gateway.stop_bot()).await;
        if let Err(err) = stopped {
            warn!(error = %err, "bot stop failed");
            guard.fail(&err);
            return Err(err);
        }

        self.confirm(guard, BotState::Stopped, "bot did not confirm stop")
            .await
    }

    /// One manual status fetch under the same staleness rule as the poller
    pub async fn refresh(&self) -> Result<BotStatus, ClientError> {
        self.require_wallet()?;
        let epoch = self.board.epoch();
        let (applied, fetched) =
            poll_once(self.gateway.as_ref(), &self.board, epoch, &self.settings.poll_settings()).await?;

        match applied {
            Applied::Applied => Ok(fetched),
            Applied::Stale => Ok(self.board.snapshot().status.unwrap_or(fetched)),
            Applied::Discarded => Err(ClientError::conflict("wallet session changed during refresh")),
        }
    }

    async fn confirm(
        &self,
        guard: BusyGuard<'_>,
        target: BotState,
        unconfirmed: &str,
    ) -> Result<BotStatus, ClientError> {
        let settings = self.settings.poll_settings();
        let attempts = self.settings.confirm_attempts.max(1);

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.settings.confirm_delay).await;
            }

            let fetched = poll_once(self.gateway.as_ref(), &self.board, guard.epoch(), &settings).await;
            let (applied, status) = match fetched {
                Ok(result) => result,
                Err(err) => {
                    warn!(attempt, error = %err, "confirmation fetch failed");
                    continue;
                }
            };

            if applied == Applied::Discarded {
                return Err(ClientError::conflict("wallet session ended during bot action"));
            }
            if status.state == target {
                info!(state = %target, attempt, "bot action confirmed");
                guard.finish(ControlState::from(&status));
                return Ok(status);
            }
            if status.state == BotState::Error {
                let err = ClientError::Gateway {
                    message: status
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "bot reported an error".to_string()),
                    status: None,
                };
                guard.fail(&err);
                return Err(err);
            }
        }

        let err = ClientError::Gateway {
            message: unconfirmed.to_string(),
            status: None,
        };
        warn!(attempts, error = %err, "bot action unconfirmed");
        guard.fail(&err);
        Err(err)
    }
}
