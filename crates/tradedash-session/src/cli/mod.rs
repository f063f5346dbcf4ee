/*
[INPUT]:  Command-line arguments
[OUTPUT]: Parsed Cli and subcommand definitions
[POS]:    CLI layer - argument surface of the tradedash binary
[UPDATE]: When adding subcommands or flags
*/

pub mod commands;
pub mod init;
pub mod prompts;
pub mod render;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tradedash_gateway::{BotStrategy, TradingPair};

#[derive(Parser, Debug)]
#[command(name = "tradedash", version, about = "Trading bot dashboard client")]
pub struct Cli {
    /// YAML configuration file
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config_path: Option<PathBuf>,
    /// Log filter, overrides the configuration (e.g. `debug`)
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,
    /// Use the simulated backend instead of the live one
    #[arg(long, global = true)]
    pub demo: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a configuration file interactively
    Init {
        #[arg(long, short, value_name = "PATH", default_value = "tradedash.yaml")]
        output: PathBuf,
    },
    /// Print the effective configuration as YAML
    Config,
    /// Exchange API credentials for a wallet session
    Connect(ConnectArgs),
    /// Forget the stored wallet session
    Disconnect,
    /// Show the bot status for the stored wallet
    Status {
        /// Fetch again and fail loudly if the backend is unreachable
        #[arg(long)]
        refresh: bool,
    },
    /// Start the trading bot
    Start(StartArgs),
    /// Stop the trading bot
    Stop,
    /// Follow bot status and balances until interrupted
    Watch,
    /// Show wallet balances
    Balances,
    /// List orders, newest first
    Orders {
        #[arg(long)]
        symbol: Option<TradingPair>,
    },
    /// Place a buy order
    Buy(OrderArgs),
    /// Place a sell order
    Sell(OrderArgs),
    /// Manage saved strategies
    #[command(subcommand)]
    Strategies(StrategyCommand),
    /// Run a backtest on the backend
    Backtest(BacktestArgs),
    /// Stream 24h tickers until interrupted
    Ticker {
        /// Pairs to follow; all supported pairs when omitted
        symbols: Vec<TradingPair>,
    },
    /// Check backend health
    Health,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub api_secret: Option<String>,
    #[arg(long)]
    pub testnet: bool,
}

#[derive(Args, Debug)]
pub struct StartArgs {
    #[arg(long, default_value = "BTCUSDT")]
    pub symbol: TradingPair,
    #[arg(long)]
    pub max_amount: Option<Decimal>,
    /// Seconds between bot iterations (5-3600)
    #[arg(long = "interval")]
    pub interval_seconds: Option<u64>,
    #[arg(long)]
    pub strategy: Option<BotStrategy>,
    /// Percent drop that triggers a buy
    #[arg(long)]
    pub buy_threshold: Option<Decimal>,
    /// Percent rise that triggers a sell
    #[arg(long)]
    pub sell_threshold: Option<Decimal>,
    /// Fill in the parameters with prompts
    #[arg(long, short)]
    pub interactive: bool,
}

#[derive(Args, Debug)]
pub struct OrderArgs {
    #[arg(long)]
    pub symbol: TradingPair,
    #[arg(long)]
    pub quantity: Decimal,
    /// Limit price; market order when omitted
    #[arg(long)]
    pub price: Option<Decimal>,
}

#[derive(Subcommand, Debug)]
pub enum StrategyCommand {
    List,
    Show { id: String },
    Delete { id: String },
    Toggle {
        id: String,
        /// Target state
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Strategy types the backend can run
    Types,
}

#[derive(Args, Debug)]
pub struct BacktestArgs {
    #[arg(long)]
    pub strategy: String,
    #[arg(long, default_value = "BTCUSDT")]
    pub symbol: TradingPair,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start: NaiveDate,
    /// YYYY-MM-DD
    #[arg(long)]
    pub end: NaiveDate,
    #[arg(long, default_value = "1000")]
    pub capital: Decimal,
}
