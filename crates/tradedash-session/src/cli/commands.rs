/*
[INPUT]:  Parsed Command, effective DashboardConfig, shutdown token
[OUTPUT]: Dashboard operations executed and rendered to stdout
[POS]:    CLI layer - command dispatch
[UPDATE]: When adding subcommands
*/

use anyhow::{Context, Result, bail};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tradedash_gateway::{MarketStream, OrderSide, TradingPair};

use tradedash_session::{BacktestParams, BotConfig, Dashboard, DashboardConfig, DataSource};

use super::{Command, ConnectArgs, OrderArgs, StartArgs, StrategyCommand, prompts, render};

pub async fn run(command: Command, config: &DashboardConfig, shutdown: CancellationToken) -> Result<()> {
    match command {
        Command::Init { .. } => bail!("init runs before configuration is loaded"),
        Command::Config => {
            let yaml = serde_yaml::to_string(config).context("serialize configuration")?;
            print!("{yaml}");
            Ok(())
        }
        Command::Ticker { symbols } => ticker(config, symbols, shutdown).await,
        other => {
            let dashboard = Dashboard::from_config(config).context("initialize dashboard")?;
            let result = dispatch(&dashboard, other, shutdown).await;
            dashboard.shutdown().await;
            result
        }
    }
}

async fn dispatch(dashboard: &Dashboard, command: Command, shutdown: CancellationToken) -> Result<()> {
    match command {
        Command::Connect(args) => connect(dashboard, args).await,
        Command::Disconnect => {
            dashboard.disconnect()?;
            println!("{}", style("Wallet session cleared.").green());
            Ok(())
        }
        Command::Status { refresh } => status(dashboard, refresh).await,
        Command::Start(args) => start(dashboard, args).await,
        Command::Stop => {
            require_session(dashboard).await?;
            dashboard.stop_bot().await.context("stop bot")?;
            print_snapshot(dashboard);
            Ok(())
        }
        Command::Watch => watch(dashboard, shutdown).await,
        Command::Balances => {
            let balances = dashboard.balances().await.context("fetch balances")?;
            print!("{}", render::balances(&balances));
            Ok(())
        }
        Command::Orders { symbol } => {
            let orders = dashboard.orders(symbol).await.context("fetch orders")?;
            print!("{}", render::orders(&orders));
            Ok(())
        }
        Command::Buy(args) => place_order(dashboard, OrderSide::Buy, args).await,
        Command::Sell(args) => place_order(dashboard, OrderSide::Sell, args).await,
        Command::Strategies(command) => strategies(dashboard, command).await,
        Command::Backtest(args) => {
            let params = BacktestParams {
                strategy: args.strategy,
                symbol: args.symbol,
                start_date: args.start,
                end_date: args.end,
                initial_capital: args.capital,
            };
            let report = dashboard.backtest(&params).await.context("run backtest")?;
            println!(
                "Backtest {} on {} ({} to {})",
                style(&params.strategy).bold(),
                params.symbol,
                params.start_date,
                params.end_date
            );
            print!("{}", render::backtest(&report));
            Ok(())
        }
        Command::Health => {
            let status = dashboard.health().await.context("health check")?;
            println!("{} backend {}", render::source_tag(dashboard.source()), style(status).green());
            Ok(())
        }
        Command::Init { .. } | Command::Config | Command::Ticker { .. } => {
            bail!("command does not use a dashboard session")
        }
    }
}

fn print_snapshot(dashboard: &Dashboard) {
    print!(
        "{}",
        render::snapshot(&dashboard.snapshot(), dashboard.wallet().as_ref())
    );
}

/// Load the stored wallet and fetch its status once
async fn require_session(dashboard: &Dashboard) -> Result<()> {
    if dashboard.resume().await.is_none() {
        bail!("no wallet connected; run `tradedash connect` first");
    }
    Ok(())
}

async fn connect(dashboard: &Dashboard, args: ConnectArgs) -> Result<()> {
    let credentials = prompts::credentials(args.api_key, args.api_secret)?;
    let wallet = dashboard
        .connect_wallet(&credentials.api_key, &credentials.api_secret, args.testnet)
        .await
        .context("connect wallet")?;
    println!("{} connected wallet {}", style("✓").green(), style(&wallet).bold());
    print_snapshot(dashboard);
    Ok(())
}

async fn status(dashboard: &Dashboard, refresh: bool) -> Result<()> {
    if dashboard.resume().await.is_none() {
        println!(
            "{} no wallet connected; run `tradedash connect`",
            render::source_tag(dashboard.source())
        );
        return Ok(());
    }
    if refresh {
        dashboard.refresh_status().await.context("refresh bot status")?;
    }
    print_snapshot(dashboard);
    Ok(())
}

fn start_config(args: &StartArgs) -> BotConfig {
    let defaults = BotConfig::with_defaults(args.symbol);
    BotConfig {
        symbol: args.symbol,
        max_amount: args.max_amount.unwrap_or(defaults.max_amount),
        interval_seconds: args.interval_seconds.unwrap_or(defaults.interval_seconds),
        strategy: args.strategy.unwrap_or(defaults.strategy),
        buy_threshold: args.buy_threshold.or(defaults.buy_threshold),
        sell_threshold: args.sell_threshold.or(defaults.sell_threshold),
    }
}

async fn start(dashboard: &Dashboard, args: StartArgs) -> Result<()> {
    let mut config = start_config(&args);
    if args.interactive {
        config = prompts::bot_config(config)?;
    }
    // Fail on bad input before touching the backend
    config.validate()?;

    require_session(dashboard).await?;
    let status = dashboard.start_bot(&config).await.context("start bot")?;
    info!(state = %status.state, "bot start finished");
    print_snapshot(dashboard);
    Ok(())
}

async fn watch(dashboard: &Dashboard, shutdown: CancellationToken) -> Result<()> {
    require_session(dashboard).await?;
    dashboard.start_background()?;

    let mut status_rx = dashboard.subscribe();
    let mut portfolio_rx = dashboard.portfolio().subscribe();
    print_snapshot(dashboard);
    println!("{}", style("Watching; press Ctrl+C to exit.").dim());

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = status_rx.borrow_and_update().clone();
                print!("{}", render::snapshot(&snapshot, dashboard.wallet().as_ref()));
            }
            changed = portfolio_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = portfolio_rx.borrow_and_update().clone();
                print!("{}", render::portfolio(&snapshot));
            }
        }
    }

    println!("{}", style("Stopped watching.").dim());
    Ok(())
}

async fn place_order(dashboard: &Dashboard, side: OrderSide, args: OrderArgs) -> Result<()> {
    let ack = dashboard
        .place_order(side, args.symbol, args.quantity, args.price)
        .await
        .with_context(|| format!("place {side} order"))?;
    print!("{}", render::order_ack(&ack));
    Ok(())
}

async fn strategies(dashboard: &Dashboard, command: StrategyCommand) -> Result<()> {
    match command {
        StrategyCommand::List => {
            let strategies = dashboard.strategies().await.context("list strategies")?;
            print!("{}", render::strategies(&strategies));
        }
        StrategyCommand::Show { id } => {
            let strategy = dashboard.strategy(&id).await.context("fetch strategy")?;
            print!("{}", render::strategy(&strategy));
        }
        StrategyCommand::Delete { id } => {
            dashboard.delete_strategy(&id).await.context("delete strategy")?;
            println!("{} deleted strategy {id}", style("✓").green());
        }
        StrategyCommand::Toggle { id, active } => {
            match dashboard.toggle_strategy(&id, active).await.context("toggle strategy")? {
                Some(strategy) => print!("{}", render::strategy(&strategy)),
                None => println!(
                    "{} strategy {id} {}",
                    style("✓").green(),
                    if active { "activated" } else { "deactivated" }
                ),
            }
        }
        StrategyCommand::Types => {
            for name in dashboard.strategy_types().await.context("list strategy types")? {
                println!("{name}");
            }
        }
    }
    Ok(())
}

async fn ticker(config: &DashboardConfig, symbols: Vec<TradingPair>, shutdown: CancellationToken) -> Result<()> {
    if config.data_source == DataSource::Demo {
        bail!("the ticker stream needs the live backend");
    }
    let symbols = if symbols.is_empty() {
        TradingPair::ALL.to_vec()
    } else {
        symbols
    };

    let mut stream = MarketStream::new(config.gateway.ws_url.clone());
    let Some(mut events) = stream.take_receiver() else {
        bail!("market stream receiver already taken");
    };
    stream
        .connect_ticker(&symbols)
        .await
        .context("connect ticker stream")?;
    println!("{}", style("Streaming tickers; press Ctrl+C to exit.").dim());

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => {
                let Some(event) = event else {
                    println!("{}", style("Stream closed by the backend.").yellow());
                    break;
                };
                if let Some(line) = render::market_event(&event) {
                    println!("{line}");
                }
            }
        }
    }

    stream.close().await;
    Ok(())
}
