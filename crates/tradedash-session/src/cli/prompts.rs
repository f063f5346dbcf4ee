/*
[INPUT]:  Terminal input via dialoguer
[OUTPUT]: Wallet credentials and BotConfig values
[POS]:    CLI interactive flow
[UPDATE]: When bot parameters or connect inputs change
*/

use anyhow::Result;
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};
use rust_decimal::Decimal;
use tradedash_gateway::{BotStrategy, TradingPair};

use tradedash_session::BotConfig;
use tradedash_session::bot_config::INTERVAL_BOUNDS;

const STRATEGIES: [BotStrategy; 2] = [BotStrategy::Simple, BotStrategy::Grid];

pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

/// Ask for whatever was not passed on the command line
pub fn credentials(api_key: Option<String>, api_secret: Option<String>) -> Result<Credentials> {
    let theme = ColorfulTheme::default();

    let api_key = match api_key {
        Some(key) => key,
        None => Input::with_theme(&theme)
            .with_prompt("API key")
            .interact_text()?,
    };
    let api_secret = match api_secret {
        Some(secret) => secret,
        None => Password::with_theme(&theme)
            .with_prompt("API secret")
            .interact()?,
    };

    Ok(Credentials { api_key, api_secret })
}

fn positive_decimal(input: &String) -> Result<(), String> {
    match input.trim().parse::<Decimal>() {
        Ok(value) if value > Decimal::ZERO => Ok(()),
        Ok(_) => Err("must be greater than zero".to_string()),
        Err(_) => Err("not a number".to_string()),
    }
}

fn prompt_decimal(theme: &ColorfulTheme, prompt: &str, default: Decimal) -> Result<Decimal> {
    let raw: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .default(default.to_string())
        .validate_with(positive_decimal)
        .interact_text()?;
    Ok(raw.trim().parse()?)
}

/// Walk through the bot form, starting from `base`
pub fn bot_config(base: BotConfig) -> Result<BotConfig> {
    let theme = ColorfulTheme::default();

    let pairs: Vec<&str> = TradingPair::ALL.iter().map(TradingPair::as_str).collect();
    let pair_index = TradingPair::ALL
        .iter()
        .position(|pair| *pair == base.symbol)
        .unwrap_or(0);
    let symbol = TradingPair::ALL[Select::with_theme(&theme)
        .with_prompt("Trading pair")
        .items(&pairs)
        .default(pair_index)
        .interact()?];

    let names: Vec<&str> = STRATEGIES.iter().map(BotStrategy::as_str).collect();
    let strategy_index = STRATEGIES
        .iter()
        .position(|strategy| *strategy == base.strategy)
        .unwrap_or(0);
    let strategy = STRATEGIES[Select::with_theme(&theme)
        .with_prompt("Strategy")
        .items(&names)
        .default(strategy_index)
        .interact()?];

    let max_amount = prompt_decimal(&theme, "Max amount (quote currency)", base.max_amount)?;

    let interval_seconds: u64 = Input::with_theme(&theme)
        .with_prompt(format!(
            "Interval seconds ({}-{})",
            INTERVAL_BOUNDS.start(),
            INTERVAL_BOUNDS.end()
        ))
        .default(base.interval_seconds)
        .validate_with(|value: &u64| {
            if INTERVAL_BOUNDS.contains(value) {
                Ok(())
            } else {
                Err("out of range")
            }
        })
        .interact_text()?;

    let (buy_threshold, sell_threshold) = if strategy.uses_thresholds() {
        let buy = prompt_decimal(
            &theme,
            "Buy threshold (% drop)",
            base.buy_threshold.unwrap_or(Decimal::new(5, 1)),
        )?;
        let sell = prompt_decimal(
            &theme,
            "Sell threshold (% rise)",
            base.sell_threshold.unwrap_or(Decimal::ONE),
        )?;
        (Some(buy), Some(sell))
    } else {
        (None, None)
    };

    Ok(BotConfig {
        symbol,
        max_amount,
        interval_seconds,
        strategy,
        buy_threshold,
        sell_threshold,
    })
}
