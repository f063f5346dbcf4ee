/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When DashboardConfig schema changes
*/

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::path::PathBuf;

use tradedash_session::{DashboardConfig, DataSource};

const CONNECT_PATHS: [&str; 2] = ["/wallet/connect", "/binance/connect"];
const LOG_LEVELS: [&str; 4] = ["info", "debug", "warn", "error"];

pub fn run_init(output: PathBuf) -> Result<()> {
    println!("{}", style("Welcome to tradedash init").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a client configuration.").dim()
    );

    let theme = ColorfulTheme::default();

    if output.exists() {
        let overwrite = Confirm::with_theme(&theme)
            .with_prompt(format!("{} exists. Overwrite?", output.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("{}", style("Nothing written.").yellow());
            return Ok(());
        }
    }

    let mut config = DashboardConfig::default();

    println!("\n{}", style("--- Backend ---").bold());
    config.gateway.base_url = Input::with_theme(&theme)
        .with_prompt("Backend URL")
        .default(config.gateway.base_url.clone())
        .validate_with(|input: &String| {
            url::Url::parse(input)
                .map(|_| ())
                .map_err(|err| err.to_string())
        })
        .interact_text()?;

    config.gateway.ws_url = Input::with_theme(&theme)
        .with_prompt("WebSocket URL")
        .default(derive_ws_url(&config.gateway.base_url))
        .interact_text()?;

    let connect_selection = Select::with_theme(&theme)
        .with_prompt("Wallet connect route")
        .items(&CONNECT_PATHS)
        .default(0)
        .interact()?;
    config.gateway.connect_path = CONNECT_PATHS[connect_selection].to_string();

    println!("\n{}", style("--- Polling ---").bold());
    config.polling.status_interval_secs = Input::with_theme(&theme)
        .with_prompt("Bot status interval (seconds)")
        .default(config.polling.status_interval_secs)
        .interact_text()?;

    config.polling.portfolio_interval_secs = Input::with_theme(&theme)
        .with_prompt("Balances/orders interval (seconds)")
        .default(config.polling.portfolio_interval_secs)
        .interact_text()?;

    println!("\n{}", style("--- Runtime ---").bold());
    let demo = Confirm::with_theme(&theme)
        .with_prompt("Use the simulated (demo) backend by default?")
        .default(false)
        .interact()?;
    config.data_source = if demo { DataSource::Demo } else { DataSource::Live };

    let level_selection = Select::with_theme(&theme)
        .with_prompt("Log level")
        .items(&LOG_LEVELS)
        .default(0)
        .interact()?;
    config.logging.level = LOG_LEVELS[level_selection].to_string();

    if let Err(errors) = config.validate() {
        bail!("configuration is invalid:\n  {}", errors.join("\n  "));
    }

    let yaml = serde_yaml::to_string(&config).context("failed to serialize config to YAML")?;

    std::fs::write(&output, yaml)
        .with_context(|| format!("failed to write config to {}", output.display()))?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );

    Ok(())
}

/// `http(s)://host` -> `ws(s)://host`
fn derive_ws_url(base_url: &str) -> String {
    if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest.trim_end_matches('/'))
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest.trim_end_matches('/'))
    } else {
        base_url.to_string()
    }
}
