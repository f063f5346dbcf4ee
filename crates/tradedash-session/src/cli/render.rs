/*
[INPUT]:  Session snapshots, portfolio data, strategies, backtest reports, market events
[OUTPUT]: Styled terminal text
[POS]:    CLI layer - presentation only, no I/O
[UPDATE]: When displayed fields change
*/

use console::style;
use std::fmt::Write as _;
use tradedash_gateway::{
    BacktestReport, MarketEvent, OrderAck, OrderRecord, Strategy, WalletBalance,
};

use tradedash_session::{ControlState, DataSource, PortfolioSnapshot, SessionSnapshot, WalletId};

pub fn source_tag(source: DataSource) -> String {
    match source {
        DataSource::Demo => style("[DEMO]").yellow().bold().to_string(),
        DataSource::Live => style("[LIVE]").green().to_string(),
    }
}

fn state_label(state: &ControlState) -> String {
    let text = state.to_string();
    match state {
        ControlState::Running => style(text).green().bold().to_string(),
        ControlState::Stopped | ControlState::Idle => style(text).dim().to_string(),
        ControlState::Starting | ControlState::Stopping => style(text).cyan().to_string(),
        ControlState::Error { .. } => style(text).red().bold().to_string(),
    }
}

pub fn snapshot(snapshot: &SessionSnapshot, wallet: Option<&WalletId>) -> String {
    let mut out = String::new();
    let wallet = wallet.map_or_else(|| "not connected".to_string(), ToString::to_string);
    let _ = writeln!(out, "{} wallet {}", source_tag(snapshot.source), style(wallet).bold());
    let _ = write!(out, "  state:      {}", state_label(&snapshot.state));
    if snapshot.busy {
        let _ = write!(out, " {}", style("(action in progress)").cyan());
    }
    out.push('\n');

    if let Some(status) = &snapshot.status {
        if let Some(config) = &status.config {
            let _ = writeln!(
                out,
                "  config:     {} max {} every {}s ({})",
                config.symbol, config.max_amount, config.interval_seconds, config.strategy
            );
            if let (Some(buy), Some(sell)) = (config.buy_threshold, config.sell_threshold) {
                let _ = writeln!(out, "  thresholds: buy -{buy}% / sell +{sell}%");
            }
        }
        if let Some(started) = &status.start_time {
            let _ = writeln!(out, "  started:    {started}");
        }
        if let Some(operation) = &status.last_operation {
            let _ = writeln!(out, "  last op:    {operation}");
        }
        if let Some(as_of) = status.as_of {
            let _ = writeln!(out, "  as of:      {}", as_of.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }

    if let Some(error) = &snapshot.last_error {
        let _ = writeln!(
            out,
            "  {} {} (failures: {})",
            style("!").red().bold(),
            error,
            snapshot.consecutive_failures
        );
    }
    out
}

pub fn balances(balances: &[WalletBalance]) -> String {
    if balances.is_empty() {
        return style("No balances.").dim().to_string() + "\n";
    }
    let mut out = format!("{:<8} {:>18} {:>18} {:>18}\n", "ASSET", "FREE", "LOCKED", "TOTAL");
    for balance in balances {
        let _ = writeln!(
            out,
            "{:<8} {:>18} {:>18} {:>18}",
            balance.asset,
            balance.free.normalize().to_string(),
            balance.locked.normalize().to_string(),
            balance.total().normalize().to_string()
        );
    }
    out
}

pub fn portfolio(snapshot: &PortfolioSnapshot) -> String {
    let mut out = balances(&snapshot.balances);
    let _ = writeln!(out, "{} open/recent orders", snapshot.orders.len());
    if let Some(error) = &snapshot.last_error {
        let _ = writeln!(out, "{} {}", style("!").red().bold(), error);
    }
    out
}

pub fn orders(orders: &[OrderRecord]) -> String {
    if orders.is_empty() {
        return style("No orders.").dim().to_string() + "\n";
    }
    let mut out = format!(
        "{:<14} {:<9} {:<5} {:<7} {:<10} {:>14} {:>14} {}\n",
        "ORDER", "SYMBOL", "SIDE", "TYPE", "STATUS", "QTY", "PRICE", "CREATED"
    );
    for order in orders {
        let price = order
            .price
            .map_or_else(|| "-".to_string(), |price| price.normalize().to_string());
        let _ = writeln!(
            out,
            "{:<14} {:<9} {:<5} {:<7} {:<10} {:>14} {:>14} {}",
            order.order_id,
            order.symbol,
            order.side,
            order.order_type,
            order.status,
            order.quantity.normalize().to_string(),
            price,
            order.created_at.as_deref().unwrap_or("-")
        );
    }
    out
}

pub fn order_ack(ack: &OrderAck) -> String {
    format!(
        "{} order {} {}\n",
        style("✓").green(),
        style(&ack.order_id).bold(),
        ack.status.as_deref().unwrap_or("accepted")
    )
}

pub fn strategies(strategies: &[Strategy]) -> String {
    if strategies.is_empty() {
        return style("No strategies.").dim().to_string() + "\n";
    }
    let mut out = String::new();
    for strategy in strategies {
        let marker = if strategy.active {
            style("●").green().to_string()
        } else {
            style("○").dim().to_string()
        };
        let _ = writeln!(
            out,
            "{marker} {:<6} {:<24} {:<14} {}",
            strategy.id.as_deref().unwrap_or("-"),
            strategy.name,
            strategy.strategy_type,
            strategy.pair
        );
    }
    out
}

pub fn strategy(strategy: &Strategy) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({})",
        style(&strategy.name).bold(),
        strategy.id.as_deref().unwrap_or("unsaved")
    );
    let _ = writeln!(out, "  type:       {}", strategy.strategy_type);
    let _ = writeln!(out, "  pair:       {}", strategy.pair);
    let _ = writeln!(out, "  active:     {}", strategy.active);
    if !strategy.timeframes.is_empty() {
        let _ = writeln!(out, "  timeframes: {}", strategy.timeframes.join(", "));
    }
    if !strategy.description.is_empty() {
        let _ = writeln!(out, "  about:      {}", strategy.description);
    }
    for (name, value) in &strategy.parameters {
        let _ = writeln!(out, "  param {name} = {value}");
    }
    if let Some(risk) = &strategy.risk_settings {
        let _ = writeln!(
            out,
            "  risk:       size {}% stop {}% take {}%",
            risk.max_position_size, risk.stop_loss, risk.take_profit
        );
    }
    out
}

pub fn backtest(report: &BacktestReport) -> String {
    fn metric(value: Option<f64>, suffix: &str) -> String {
        value.map_or_else(|| "-".to_string(), |value| format!("{value:.2}{suffix}"))
    }

    let mut out = String::new();
    let _ = writeln!(out, "  total return:  {}", metric(report.total_return, "%"));
    let _ = writeln!(out, "  win rate:      {}", metric(report.win_rate.map(|rate| rate * 100.0), "%"));
    let _ = writeln!(out, "  max drawdown:  {}", metric(report.max_drawdown, "%"));
    let _ = writeln!(out, "  sharpe ratio:  {}", metric(report.sharpe_ratio, ""));
    let _ = writeln!(
        out,
        "  trades:        {}",
        report.total_trades.map_or_else(|| "-".to_string(), |trades| trades.to_string())
    );
    let _ = writeln!(out, "  final capital: {}", metric(report.final_capital, ""));
    out
}

pub fn market_event(event: &MarketEvent) -> Option<String> {
    match event {
        MarketEvent::Ticker(ticker) => {
            let change = ticker
                .price_change_percent
                .map(|change| {
                    let text = format!("{:+.2}%", change);
                    if change.is_sign_negative() {
                        style(text).red().to_string()
                    } else {
                        style(text).green().to_string()
                    }
                })
                .unwrap_or_default();
            Some(format!(
                "{:<9} {:>14} {change}  h {} l {}",
                ticker.symbol,
                ticker.last_price.normalize().to_string(),
                ticker.high.normalize(),
                ticker.low.normalize()
            ))
        }
        MarketEvent::Kline(kline) => Some(format!(
            "{:<9} {} close {}",
            kline.symbol,
            kline.interval,
            kline.close.normalize()
        )),
        MarketEvent::Other(_) => None,
    }
}
