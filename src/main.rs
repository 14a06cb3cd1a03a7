//! ARB-MONITOR — BTC/ETH price-move watcher
//!
//! Entry point. Loads `.env` and configuration, initialises structured
//! logging, installs the process-wide fault handlers, and runs the monitor
//! loop until Ctrl+C. A failed loop is logged but never exits the process.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use arb_monitor::action;
use arb_monitor::config::AppConfig;
use arb_monitor::engine::Monitor;
use arb_monitor::prices::coingecko::CoinGeckoClient;
use arb_monitor::types::{MonitorExit, MonitorStats};

const CONFIG_PATH: &str = "config.toml";

const BANNER: &str = r#"
    _    ____  ____        __  __  ___  _   _
   / \  |  _ \| __ )      |  \/  |/ _ \| \ | |
  / _ \ | |_) |  _ \ _____| |\/| | | | |  \| |
 / ___ \|  _ <| |_) |_____| |  | | |_| | |\  |
/_/   \_\_| \_\____/      |_|  |_|\___/|_| \_|

  BTC/ETH price-move watcher
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default(CONFIG_PATH)?;

    init_logging();
    install_panic_hook();

    println!("{BANNER}");
    info!(
        threshold_pct = %cfg.monitor.threshold_pct,
        stable_delay_secs = cfg.monitor.stable_delay_secs,
        stable_reentry = ?cfg.monitor.stable_reentry,
        price_source = %cfg.price_source.base_url,
        "ARB-MONITOR starting up"
    );

    // -- Initialise components -------------------------------------------

    let source = CoinGeckoClient::from_config(&cfg.price_source, cfg.price_api_key())?;
    if !source.has_api_key() {
        warn!(
            env = %cfg.price_source.api_key_env,
            "No price API key set, using the public rate limit"
        );
    }

    let action = action::from_config(&cfg.action);
    let mut monitor = Monitor::new(Box::new(source), action, &cfg.monitor);

    // -- Main loop -------------------------------------------------------

    let task = tokio::spawn(async move {
        let result = monitor.run(shutdown_signal()).await;
        (result, monitor.stats().clone())
    });

    match task.await {
        Ok((Ok(MonitorExit::Shutdown), stats)) => {
            log_final_stats(&stats);
            info!("ARB-MONITOR shut down cleanly.");
            return Ok(());
        }
        Ok((Ok(MonitorExit::Parked), stats)) => {
            log_final_stats(&stats);
            warn!("Monitor parked after re-entry. Idling until killed.");
        }
        Ok((Err(e), stats)) => {
            log_final_stats(&stats);
            error!(error = %e, "Monitor loop stopped. Idling until killed.");
        }
        Err(e) => {
            error!(error = %e, "Monitor task aborted. Idling until killed.");
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received.");
    Ok(())
}

/// Resolves on Ctrl+C. If the signal handler cannot be installed, never
/// resolves, so the monitor keeps running.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn log_final_stats(stats: &MonitorStats) {
    info!(
        cycles = stats.cycles,
        up = stats.up_moves,
        down = stats.down_moves,
        stable = stats.stable_cycles,
        actions_ok = stats.actions_ok,
        actions_failed = stats.actions_failed,
        uptime_secs = stats.uptime().num_seconds(),
        "Monitor summary"
    );
}

/// Log panics through `tracing`. The default hook is replaced, not chained,
/// so panics are reported once.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic| {
        let location = panic
            .location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        error!(%location, panic = %panic, "Panic");
    }));
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("arb_monitor=info"));

    let json_logging = std::env::var("ARB_MONITOR_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
