/*
[INPUT]:  CLI arguments, YAML configuration file, TRADEDASH_* environment, OS shutdown signals
[OUTPUT]: One dashboard command executed against the live or demo backend
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cli::{Cli, Command};
use tradedash_session::config::LoggingSection;
use tradedash_session::{DashboardConfig, DataSource};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if let Command::Init { output } = &args.command {
        return cli::init::run_init(output.clone());
    }

    let mut config =
        DashboardConfig::load(args.config_path.as_deref()).context("load configuration")?;
    if args.demo {
        config.data_source = DataSource::Demo;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Err(errors) = config.validate() {
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }

    let _log_guard = init_tracing(&config.logging)?;
    debug!(
        config_path = ?args.config_path,
        data_source = %config.data_source,
        base_url = %config.gateway.base_url,
        "configuration loaded"
    );

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    cli::commands::run(args.command, &config, shutdown).await
}

/// Console logs go to stderr so command output stays clean; a daily file
/// is added when `logging.dir` is set and writable.
fn init_tracing(logging: &LoggingSection) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&logging.level).context("invalid log level")?;
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match logging.dir.as_deref() {
        Some(dir) => match prepare_log_dir(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, "tradedash.log");
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true);
                (Some(layer), Some(guard))
            }
            Err(err) => {
                eprintln!("file logging disabled: {err:#}");
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

/// The rolling appender panics if it cannot create its file; check first
fn prepare_log_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let marker = dir.join(".tradedash_write_test");
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&marker)
        .with_context(|| format!("{} is not writable", dir.display()))?;
    let _ = std::fs::remove_file(&marker);
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
