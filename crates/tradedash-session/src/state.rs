/*
[INPUT]:  Fetched bot statuses, fetch failures, control actions
[OUTPUT]: ControlState machine and published SessionSnapshot values
[POS]:    Session layer - shared status board written by the facade and the poller
[UPDATE]: When control states, staleness or failure rules change
*/

use std::fmt;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::demo::DataSource;
use crate::error::ClientError;
use crate::status::{BotState, BotStatus};

pub const CONNECTION_LOST: &str = "connection lost";

/// Client-side bot lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlState {
    /// No wallet session, or status not yet known
    Idle,
    Stopped,
    Starting,
    Running,
    Stopping,
    Error {
        message: String,
        connection_lost: bool,
    },
}

impl ControlState {
    fn from_status(status: &BotStatus) -> Self {
        match status.state {
            BotState::Stopped => ControlState::Stopped,
            BotState::Running => ControlState::Running,
            BotState::Error => ControlState::Error {
                message: status
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "bot reported an error".to_string()),
                connection_lost: false,
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ControlState::Error {
            message: message.into(),
            connection_lost: false,
        }
    }

    pub fn is_transitional(&self) -> bool {
        matches!(self, ControlState::Starting | ControlState::Stopping)
    }

    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            ControlState::Error {
                connection_lost: true,
                ..
            }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ControlState::Idle => "idle",
            ControlState::Stopped => "stopped",
            ControlState::Starting => "starting",
            ControlState::Running => "running",
            ControlState::Stopping => "stopping",
            ControlState::Error { .. } => "error",
        }
    }
}

impl From<&BotStatus> for ControlState {
    fn from(status: &BotStatus) -> Self {
        ControlState::from_status(status)
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlState::Error { message, .. } => write!(f, "error: {message}"),
            other => f.write_str(other.label()),
        }
    }
}

/// What subscribers see
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: ControlState,
    /// Last known-good status; kept through failures
    pub status: Option<BotStatus>,
    /// A start or stop is in flight
    pub busy: bool,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub source: DataSource,
}

impl SessionSnapshot {
    fn idle(source: DataSource) -> Self {
        Self {
            state: ControlState::Idle,
            status: None,
            busy: false,
            consecutive_failures: 0,
            last_error: None,
            source,
        }
    }

    pub fn can_start(&self) -> bool {
        !self.busy && !matches!(self.state, ControlState::Running | ControlState::Idle)
    }

    pub fn can_stop(&self) -> bool {
        !self.busy && matches!(self.state, ControlState::Running | ControlState::Error { .. })
    }
}

/// Outcome of offering a fetched status to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// Older than the held status; discarded
    Stale,
    /// Fetched under a session that has since ended
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Start,
    Stop,
}

#[derive(Debug)]
struct BoardInner {
    snapshot: SessionSnapshot,
    // Bumped whenever a wallet session begins or ends
    epoch: u64,
}

/// Shared bot status, mutated only by the control facade and the poller.
///
/// Every mutation happens under one lock and is republished on a watch channel.
#[derive(Debug)]
pub struct StatusBoard {
    inner: Mutex<BoardInner>,
    tx: watch::Sender<SessionSnapshot>,
}

impl StatusBoard {
    pub fn new(source: DataSource) -> Self {
        let snapshot = SessionSnapshot::idle(source);
        let (tx, _rx) = watch::channel(snapshot.clone());
        Self {
            inner: Mutex::new(BoardInner { snapshot, epoch: 0 }),
            tx,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Start a fresh wallet session: state returns to `Idle` until the first fetch
    pub fn begin_session(&self) -> u64 {
        self.reset("session started")
    }

    /// End the wallet session; in-flight results from it will be discarded
    pub fn end_session(&self) -> u64 {
        self.reset("session ended")
    }

    fn reset(&self, reason: &str) -> u64 {
        self.mutate(|inner| {
            inner.epoch += 1;
            inner.snapshot = SessionSnapshot::idle(inner.snapshot.source);
            debug!(epoch = inner.epoch, reason, "status board reset");
            inner.epoch
        })
    }

    /// Offer a fetched status.
    ///
    /// Older statuses never replace newer ones. While an action is in flight
    /// the data is refreshed but the state machine is left to the facade.
    pub fn apply_fetched(&self, epoch: u64, status: BotStatus) -> Applied {
        self.mutate(|inner| {
            if inner.epoch != epoch {
                return Applied::Discarded;
            }
            let snapshot = &mut inner.snapshot;
            snapshot.consecutive_failures = 0;
            snapshot.last_error = None;

            if let Some(held) = snapshot.status.as_ref()
                && status.is_older_than(held)
            {
                debug!(fetched = ?status.as_of, held = ?held.as_of, "stale bot status discarded");
                if !snapshot.busy && snapshot.state.is_connection_lost() {
                    snapshot.state = ControlState::from_status(held);
                }
                return Applied::Stale;
            }

            if !snapshot.busy {
                let next = ControlState::from_status(&status);
                if next != snapshot.state {
                    info!(from = %snapshot.state, to = %next, "bot state changed");
                }
                snapshot.state = next;
            }
            snapshot.status = Some(status);
            Applied::Applied
        })
    }

    /// Count a failed fetch; at `threshold` consecutive failures the state
    /// degrades to a connection-lost error while the last status is kept.
    pub fn record_failure(&self, epoch: u64, message: &str, threshold: u32) -> Option<ControlState> {
        self.mutate(|inner| {
            if inner.epoch != epoch {
                return None;
            }
            let snapshot = &mut inner.snapshot;
            snapshot.consecutive_failures = snapshot.consecutive_failures.saturating_add(1);
            snapshot.last_error = Some(message.to_string());
            warn!(
                failures = snapshot.consecutive_failures,
                error = message,
                "bot status fetch failed"
            );

            if snapshot.consecutive_failures >= threshold.max(1) && !snapshot.busy {
                snapshot.state = ControlState::Error {
                    message: CONNECTION_LOST.to_string(),
                    connection_lost: true,
                };
            }
            Some(snapshot.state.clone())
        })
    }

    /// Claim the busy flag for a start or stop.
    ///
    /// Rejected without side effects when another action is in flight or the
    /// current state does not allow the action.
    pub fn try_begin(&self, action: BotAction) -> Result<BusyGuard<'_>, ClientError> {
        let epoch = self.mutate(|inner| {
            let snapshot = &mut inner.snapshot;
            if snapshot.busy {
                return Err(ClientError::conflict("another bot action is in progress"));
            }
            match (action, &snapshot.state) {
                (BotAction::Start, ControlState::Running) => {
                    return Err(ClientError::conflict("bot is already running; stop the bot first"));
                }
                (BotAction::Start, ControlState::Idle) => {
                    return Err(ClientError::conflict("bot status unknown; refresh first"));
                }
                (BotAction::Stop, ControlState::Running | ControlState::Error { .. }) => {}
                (BotAction::Stop, _) => {
                    return Err(ClientError::conflict("bot is not running"));
                }
                _ => {}
            }
            snapshot.busy = true;
            snapshot.state = match action {
                BotAction::Start => ControlState::Starting,
                BotAction::Stop => ControlState::Stopping,
            };
            Ok(inner.epoch)
        })?;

        Ok(BusyGuard {
            board: self,
            epoch,
            settled: false,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoardInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut BoardInner) -> R) -> R {
        let mut inner = self.lock();
        let before = inner.snapshot.clone();
        let result = f(&mut inner);
        if inner.snapshot != before {
            self.tx.send_replace(inner.snapshot.clone());
        }
        result
    }
}

/// Holds the busy flag; released on every exit path including drop
#[derive(Debug)]
pub struct BusyGuard<'a> {
    board: &'a StatusBoard,
    epoch: u64,
    settled: bool,
}

impl BusyGuard<'_> {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Release the flag with a final state
    pub fn finish(mut self, state: ControlState) {
        self.settle(Some(state));
    }

    pub fn fail(self, err: &ClientError) {
        self.finish(ControlState::error(err.to_string()));
    }

    fn settle(&mut self, state: Option<ControlState>) {
        if self.settled {
            return;
        }
        self.settled = true;
        let epoch = self.epoch;
        self.board.mutate(|inner| {
            // A session reset already cleared the flag and state
            if inner.epoch != epoch {
                return;
            }
            inner.snapshot.busy = false;
            match state {
                Some(state) => inner.snapshot.state = state,
                None if inner.snapshot.state.is_transitional() => {
                    warn!("bot action interrupted before completion");
                    inner.snapshot.state = ControlState::error("bot action interrupted");
                }
                None => {}
            }
        });
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.settle(None);
    }
}
