/*
[INPUT]:  Raw WebSocket text frames relayed by the backend
[OUTPUT]: Parsed MarketEvent values
[POS]:    WebSocket layer - message parsing and validation
[UPDATE]: When adding new stream types or changing frame format
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::models::serde_helpers;

/// 24h rolling ticker (exchange `24hrTicker` frame)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TickerData {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "E", default)]
    pub event_time: i64,
    #[serde(rename = "c", default, deserialize_with = "serde_helpers::deserialize_quantity")]
    pub last_price: Decimal,
    #[serde(rename = "P", default, deserialize_with = "serde_helpers::deserialize_optional_decimal")]
    pub price_change_percent: Option<Decimal>,
    #[serde(rename = "h", default, deserialize_with = "serde_helpers::deserialize_quantity")]
    pub high: Decimal,
    #[serde(rename = "l", default, deserialize_with = "serde_helpers::deserialize_quantity")]
    pub low: Decimal,
    #[serde(rename = "v", default, deserialize_with = "serde_helpers::deserialize_quantity")]
    pub volume: Decimal,
}

/// Candle update (exchange `kline` frame, inner `k` object)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KlineData {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "t", default)]
    pub open_time: i64,
    #[serde(rename = "T", default)]
    pub close_time: i64,
    #[serde(rename = "o", default, deserialize_with = "serde_helpers::deserialize_quantity")]
    pub open: Decimal,
    #[serde(rename = "h", default, deserialize_with = "serde_helpers::deserialize_quantity")]
    pub high: Decimal,
    #[serde(rename = "l", default, deserialize_with = "serde_helpers::deserialize_quantity")]
    pub low: Decimal,
    #[serde(rename = "c", default, deserialize_with = "serde_helpers::deserialize_quantity")]
    pub close: Decimal,
    #[serde(rename = "v", default, deserialize_with = "serde_helpers::deserialize_quantity")]
    pub volume: Decimal,
    /// Whether the candle is final
    #[serde(rename = "x", default)]
    pub closed: bool,
}

/// Market stream event
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    Ticker(TickerData),
    Kline(KlineData),
    /// Anything unrecognized; never fatal to the stream
    Other(Value),
}

impl MarketEvent {
    /// Parse a text frame. Combined-stream wrappers (`{"stream", "data"}`) are unwrapped.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        let value = match value {
            Value::Object(mut map) if map.contains_key("stream") && map.contains_key("data") => {
                map.remove("data").unwrap_or_default()
            }
            other => other,
        };

        let event_type = value.get("e").and_then(Value::as_str).unwrap_or_default();
        match event_type {
            "24hrTicker" | "24hrMiniTicker" => match serde_json::from_value(value.clone()) {
                Ok(ticker) => MarketEvent::Ticker(ticker),
                Err(_) => MarketEvent::Other(value),
            },
            "kline" => match value.get("k").cloned().map(serde_json::from_value) {
                Some(Ok(kline)) => MarketEvent::Kline(kline),
                _ => MarketEvent::Other(value),
            },
            _ => MarketEvent::Other(value),
        }
    }

    pub fn channel(&self) -> &'static str {
        match self {
            MarketEvent::Ticker(_) => "ticker",
            MarketEvent::Kline(_) => "kline",
            MarketEvent::Other(_) => "other",
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            MarketEvent::Ticker(ticker) => Some(&ticker.symbol),
            MarketEvent::Kline(kline) => Some(&kline.symbol),
            MarketEvent::Other(_) => None,
        }
    }
}
