/*
[INPUT]:  User-entered bot parameters
[OUTPUT]: Validated BotConfig and the backend start request
[POS]:    Domain layer - bot start configuration
[UPDATE]: When bot parameters or their bounds change
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tradedash_gateway::{BotStartRequest, BotStrategy, TradingPair};

use crate::error::ClientError;
use crate::session::WalletId;

/// Allowed polling cadence of the bot itself, in seconds
pub const INTERVAL_BOUNDS: RangeInclusive<u64> = 5..=3600;

/// Parameters for starting the trading bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub symbol: TradingPair,
    pub max_amount: Decimal,
    pub interval_seconds: u64,
    pub strategy: BotStrategy,
    #[serde(default)]
    pub buy_threshold: Option<Decimal>,
    #[serde(default)]
    pub sell_threshold: Option<Decimal>,
}

impl BotConfig {
    /// Form defaults: 100 max, 60 s, simple strategy, 0.5 % / 1.0 % thresholds
    pub fn with_defaults(symbol: TradingPair) -> Self {
        Self {
            symbol,
            max_amount: Decimal::from(100),
            interval_seconds: 60,
            strategy: BotStrategy::Simple,
            buy_threshold: Some(Decimal::new(5, 1)),
            sell_threshold: Some(Decimal::ONE),
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.max_amount <= Decimal::ZERO {
            return Err(ClientError::validation("max_amount must be greater than zero"));
        }
        if !INTERVAL_BOUNDS.contains(&self.interval_seconds) {
            return Err(ClientError::validation(format!(
                "interval_seconds must be between {} and {}",
                INTERVAL_BOUNDS.start(),
                INTERVAL_BOUNDS.end()
            )));
        }

        let required = self.strategy.uses_thresholds();
        check_threshold("buy_threshold", self.buy_threshold, required)?;
        check_threshold("sell_threshold", self.sell_threshold, required)?;
        Ok(())
    }

    pub fn to_request(&self, wallet_id: &WalletId) -> BotStartRequest {
        BotStartRequest {
            wallet_id: wallet_id.as_str().to_string(),
            symbol: self.symbol,
            max_amount: self.max_amount,
            interval_seconds: self.interval_seconds,
            strategy: self.strategy,
            buy_threshold: self.buy_threshold,
            sell_threshold: self.sell_threshold,
        }
    }
}

fn check_threshold(name: &str, value: Option<Decimal>, required: bool) -> Result<(), ClientError> {
    match value {
        Some(value) if value <= Decimal::ZERO => Err(ClientError::validation(format!(
            "{name} must be greater than zero"
        ))),
        None if required => Err(ClientError::validation(format!(
            "{name} is required for the simple strategy"
        ))),
        _ => Ok(()),
    }
}
