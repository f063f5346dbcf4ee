/*
[INPUT]:  Raw /bot/status payloads
[OUTPUT]: Classified BotStatus snapshots
[POS]:    Domain layer - authoritative bot status as reported by the backend
[UPDATE]: When the status payload or the closed state set changes
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tradedash_gateway::{BotStatusResponse, RunningConfig};

/// Bot state as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotState {
    Stopped,
    Running,
    Error,
}

impl BotState {
    /// Unrecognized values classify as `Error`
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stopped" => BotState::Stopped,
            "running" => BotState::Running,
            _ => BotState::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BotState::Stopped => "stopped",
            BotState::Running => "running",
            BotState::Error => "error",
        }
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotStatus {
    pub state: BotState,
    /// Effective configuration; present only while running
    pub config: Option<RunningConfig>,
    pub last_operation: Option<String>,
    /// Present only in the error state
    pub error_message: Option<String>,
    /// Server timestamp used for ordering
    pub as_of: Option<DateTime<Utc>>,
    pub symbol: Option<String>,
    pub wallet_id: Option<String>,
    pub start_time: Option<String>,
}

impl BotStatus {
    pub fn from_response(response: BotStatusResponse) -> Self {
        let state = BotState::from_wire(&response.status);
        let as_of = response.as_of();

        let config = match state {
            BotState::Running => response.config,
            _ => None,
        };
        let error_message = match state {
            BotState::Error => response
                .error_message
                .filter(|message| !message.trim().is_empty())
                .or_else(|| Some(format!("unrecognized bot status: {:?}", response.status))),
            _ => None,
        };

        Self {
            state,
            config,
            last_operation: response.last_operation,
            error_message,
            as_of,
            symbol: response.symbol,
            wallet_id: response.wallet_id,
            start_time: response.start_time,
        }
    }

    /// Whether `self` is older than `other` by server time.
    ///
    /// Statuses without a timestamp cannot be ordered and are never older.
    pub fn is_older_than(&self, other: &BotStatus) -> bool {
        match (self.as_of, other.as_of) {
            (Some(mine), Some(theirs)) => mine < theirs,
            _ => false,
        }
    }
}
