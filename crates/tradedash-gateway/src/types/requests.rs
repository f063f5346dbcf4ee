/*
[INPUT]:  Backend schema definitions and serde requirements
[OUTPUT]: Typed Rust request structs with serialization support
[POS]:    Data layer - type definitions for backend communication
[UPDATE]: When the backend schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{BotStrategy, TradingPair};
use super::models::Strategy;

/// Credential exchange for a wallet session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletConnectRequest {
    pub api_key: String,
    pub api_secret: String,
    pub use_testnet: bool,
}

/// Body of `POST /bot/start`. Decimals go out as JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotStartRequest {
    pub wallet_id: String,
    pub symbol: TradingPair,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_amount: Decimal,
    pub interval_seconds: u64,
    pub strategy: BotStrategy,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub buy_threshold: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub sell_threshold: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: TradingPair,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    pub wallet_id: String,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
}

/// Strategy create/update body: `{ "strategy": { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPayload {
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyToggleRequest {
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    pub strategy: String,
    pub symbol: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub initial_capital: Decimal,
}
