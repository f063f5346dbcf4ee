/*
[INPUT]:  Backend schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for backend communication
[UPDATE]: When the backend schema changes or new closed sets are added
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading pairs the bot may be started on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingPair {
    #[serde(rename = "BTCUSDT")]
    BtcUsdt,
    #[serde(rename = "ETHUSDT")]
    EthUsdt,
    #[serde(rename = "BNBUSDT")]
    BnbUsdt,
    #[serde(rename = "ADAUSDT")]
    AdaUsdt,
    #[serde(rename = "DOGEUSDT")]
    DogeUsdt,
}

impl TradingPair {
    pub const ALL: [TradingPair; 5] = [
        TradingPair::BtcUsdt,
        TradingPair::EthUsdt,
        TradingPair::BnbUsdt,
        TradingPair::AdaUsdt,
        TradingPair::DogeUsdt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradingPair::BtcUsdt => "BTCUSDT",
            TradingPair::EthUsdt => "ETHUSDT",
            TradingPair::BnbUsdt => "BNBUSDT",
            TradingPair::AdaUsdt => "ADAUSDT",
            TradingPair::DogeUsdt => "DOGEUSDT",
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingPair {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let upper = value.trim().to_ascii_uppercase();
        TradingPair::ALL
            .into_iter()
            .find(|pair| pair.as_str() == upper)
            .ok_or_else(|| format!("unsupported trading pair: {value}"))
    }
}

/// Bot strategy identifiers understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStrategy {
    Simple,
    Grid,
}

impl BotStrategy {
    /// Whether the strategy trades on buy/sell percentage thresholds
    pub fn uses_thresholds(&self) -> bool {
        matches!(self, BotStrategy::Simple)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BotStrategy::Simple => "simple",
            BotStrategy::Grid => "grid",
        }
    }
}

impl fmt::Display for BotStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(BotStrategy::Simple),
            "grid" => Ok(BotStrategy::Grid),
            other => Err(format!("unsupported strategy: {other}")),
        }
    }
}

/// Order side; selects `/trading/buy` or `/trading/sell`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub(crate) fn endpoint(&self) -> &'static str {
        match self {
            OrderSide::Buy => "/trading/buy",
            OrderSide::Sell => "/trading/sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("BUY"),
            OrderSide::Sell => f.write_str("SELL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("BTCUSDT", TradingPair::BtcUsdt)]
    #[case("ethusdt", TradingPair::EthUsdt)]
    #[case(" DOGEUSDT ", TradingPair::DogeUsdt)]
    fn trading_pair_parses_case_insensitively(#[case] raw: &str, #[case] expected: TradingPair) {
        assert_eq!(raw.parse::<TradingPair>(), Ok(expected));
    }

    #[test]
    fn trading_pair_rejects_unlisted_symbol() {
        assert!("XRPUSDT".parse::<TradingPair>().is_err());
    }

    #[test]
    fn trading_pair_serializes_as_symbol() {
        let json = serde_json::to_string(&TradingPair::BnbUsdt).unwrap();
        assert_eq!(json, "\"BNBUSDT\"");
    }

    #[test]
    fn only_simple_strategy_uses_thresholds() {
        assert!(BotStrategy::Simple.uses_thresholds());
        assert!(!BotStrategy::Grid.uses_thresholds());
        assert_eq!("GRID".parse::<BotStrategy>(), Ok(BotStrategy::Grid));
    }
}
