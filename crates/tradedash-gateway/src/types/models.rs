/*
[INPUT]:  Backend schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with lenient deserialization for display data
[POS]:    Data layer - type definitions for backend communication
[UPDATE]: When the backend schema changes or new types added
*/

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One asset line of a wallet balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub asset: String,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub free: Decimal,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub locked: Decimal,
}

impl WalletBalance {
    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

/// Configuration the backend reports for a running bot.
///
/// Strategy and symbol stay free-form here: the backend echoes whatever it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningConfig {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub max_amount: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_whole_seconds")]
    pub interval_seconds: u64,
    #[serde(default)]
    pub strategy: String,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub buy_threshold: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub sell_threshold: Option<Decimal>,
}

/// Order as listed by `/trading/orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(
        default,
        alias = "orderId",
        deserialize_with = "serde_helpers::deserialize_id"
    )]
    pub order_id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub side: String,
    #[serde(default, rename = "type")]
    pub order_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(
        default,
        alias = "origQty",
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub quantity: Decimal,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(
        default,
        alias = "executedQty",
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub executed_quantity: Decimal,
    #[serde(
        default,
        alias = "cummulativeQuoteQty",
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub cumulative_quote_quantity: Decimal,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Risk block attached to a stored strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSettings {
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub max_position_size: Decimal,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub stop_loss: Decimal,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub take_profit: Decimal,
    #[serde(default)]
    pub trailing_stop: bool,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_quantity",
        serialize_with = "serde_helpers::serialize_decimal_as_number"
    )]
    pub trailing_stop_percent: Decimal,
}

/// Strategy definition stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub strategy_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pair: String,
    #[serde(default)]
    pub timeframes: Vec<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_settings: Option<RiskSettings>,
    #[serde(default)]
    pub active: bool,
}

/// Performance summary returned by `/backtest`.
///
/// Known metrics are typed; anything else the backend reports is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    #[serde(default, alias = "totalReturn", skip_serializing_if = "Option::is_none")]
    pub total_return: Option<f64>,
    #[serde(default, alias = "winRate", skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<f64>,
    #[serde(default, alias = "maxDrawdown", skip_serializing_if = "Option::is_none")]
    pub max_drawdown: Option<f64>,
    #[serde(default, alias = "sharpeRatio", skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<f64>,
    #[serde(default, alias = "totalTrades", skip_serializing_if = "Option::is_none")]
    pub total_trades: Option<u64>,
    #[serde(default, alias = "finalCapital", skip_serializing_if = "Option::is_none")]
    pub final_capital: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 and naive ISO-8601 (treated as UTC), the two shapes the backend emits.
pub fn parse_server_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

pub(crate) mod serde_helpers {
    use super::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::str::FromStr;

    fn decimal_from_value(value: &Value) -> Option<Decimal> {
        match value {
            Value::String(raw) => Decimal::from_str(raw.trim()).ok(),
            Value::Number(number) => Decimal::from_str(&number.to_string())
                .ok()
                .or_else(|| number.as_f64().and_then(Decimal::from_f64_retain)),
            _ => None,
        }
    }

    /// Quantities for display: missing, malformed or negative values become zero
    pub fn deserialize_quantity<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(decimal_from_value(&value)
            .filter(|decimal| !decimal.is_sign_negative())
            .unwrap_or(Decimal::ZERO))
    }

    pub fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(decimal_from_value(&value))
    }

    pub fn serialize_decimal_as_number<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value.to_f64() {
            Some(number) => serializer.serialize_f64(number),
            None => serializer.serialize_str(&value.to_string()),
        }
    }

    /// Second counts may arrive as floats or strings; unusable values become zero
    pub fn deserialize_whole_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(decimal_from_value(&value)
            .and_then(|decimal| decimal.trunc().to_u64())
            .unwrap_or(0))
    }

    /// Any JSON value as text: `null` is empty, scalars keep their literal form
    pub fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => String::new(),
            Value::String(raw) => raw,
            other => other.to_string(),
        })
    }

    fn id_from_value(value: Value) -> Option<String> {
        match value {
            Value::String(raw) if !raw.is_empty() => Some(raw),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    /// Identifiers arrive as strings or integers depending on the exchange
    pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(id_from_value(value).unwrap_or_default())
    }

    pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(id_from_value(value))
    }
}
