/*
[INPUT]:  Backend schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for backend communication
[UPDATE]: When the backend schema changes or new types added
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::models::{
    OrderRecord, RunningConfig, Strategy, WalletBalance, parse_server_time, serde_helpers,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletConnectResponse {
    pub wallet_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    #[serde(default)]
    pub balances: Vec<WalletBalance>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Raw `/bot/status` payload.
///
/// `status` stays a string here; classification into a closed set happens
/// in the session layer so unknown values never fail deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotStatusResponse {
    #[serde(default, deserialize_with = "serde_helpers::deserialize_text")]
    pub status: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub wallet_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub last_operation: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub config: Option<RunningConfig>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl BotStatusResponse {
    /// Server timestamp of this status, if present and parseable
    pub fn as_of(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_server_time)
    }
}

/// Reply to `/bot/start` and `/bot/stop`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub config: Option<RunningConfig>,
}

impl ControlResponse {
    /// A 2xx body can still report failure through `success: false`
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false)
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Acknowledgement of a placed order; the backend forwards the exchange payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    #[serde(
        default,
        alias = "orderId",
        deserialize_with = "serde_helpers::deserialize_id"
    )]
    pub order_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderList {
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Envelope shared by the `/strategies` endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default)]
    pub strategies: Option<Vec<Strategy>>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StrategyEnvelope {
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false)
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyTypesResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub types: Vec<Value>,
}

impl StrategyTypesResponse {
    /// Display names; entries are either plain strings or objects with `name`/`id`
    pub fn names(&self) -> Vec<String> {
        self.types
            .iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name.clone()),
                Value::Object(map) => map
                    .get("name")
                    .or_else(|| map.get("id"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect()
    }
}
