//! Monitor loop.
//!
//! Each cycle fetches a BTC/ETH quote, classifies it against the reference
//! pair, and either triggers the action routine and re-checks immediately,
//! or waits out the stable delay. The loop is an explicit `loop`, so a long
//! run of volatile cycles does not grow the stack, and only one cycle is
//! ever in flight.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::action::ArbitrageAction;
use crate::config::{MonitorConfig, StableReentry};
use crate::engine::classifier::ReferencePrices;
use crate::prices::PriceSource;
use crate::types::{
    ActionOutcome, CycleReport, MonitorError, MonitorExit, MonitorStats, MoveTrigger, NextStep,
    PriceMove, PricePair, PriceQuote,
};

/// One fetch + classification.
#[derive(Debug, Clone)]
struct Observation {
    quote: PriceQuote,
    price_move: PriceMove,
    trigger: Option<MoveTrigger>,
}

pub struct Monitor {
    source: Box<dyn PriceSource>,
    action: Box<dyn ArbitrageAction>,
    reference: ReferencePrices,
    stable_delay: Duration,
    reentry: StableReentry,
    stats: MonitorStats,
}

impl Monitor {
    pub fn new(
        source: Box<dyn PriceSource>,
        action: Box<dyn ArbitrageAction>,
        cfg: &MonitorConfig,
    ) -> Self {
        Self {
            source,
            action,
            reference: ReferencePrices::new(cfg.thresholds()),
            stable_delay: cfg.stable_delay(),
            reentry: cfg.stable_reentry,
            stats: MonitorStats::default(),
        }
    }

    /// Current reference pair.
    pub fn reference(&self) -> PricePair {
        self.reference.pair()
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    /// Fetch a quote and classify it, updating the reference pair on any
    /// non-stable move. Fetch and parse failures are returned as-is.
    pub async fn check_prices(&mut self) -> Result<PriceMove, MonitorError> {
        self.observe().await.map(|obs| obs.price_move)
    }

    async fn observe(&mut self) -> Result<Observation, MonitorError> {
        let source_name = self.source.name();
        let quote = self
            .source
            .fetch_quote()
            .await
            .map_err(|e| match e.downcast::<MonitorError>() {
                Ok(err) => err,
                Err(e) => MonitorError::PriceSource {
                    source_name: source_name.to_string(),
                    message: format!("{e:#}"),
                },
            })?;

        info!(
            btc_ref = %self.reference.pair().btc,
            btc = %quote.prices.btc,
            eth_ref = %self.reference.pair().eth,
            eth = %quote.prices.eth,
            "Prices fetched"
        );

        let (price_move, trigger) = self.reference.observe(quote.prices);
        Ok(Observation {
            quote,
            price_move,
            trigger,
        })
    }

    /// Run one cycle: check prices, trigger the action on a move, and report
    /// when the next cycle should start.
    ///
    /// Action failures (errors or panics) are logged and recorded in the
    /// report; they never fail the cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, MonitorError> {
        let cycle_number = self.stats.cycles + 1;
        let obs = self.observe().await?;

        let (action, next) = match obs.price_move.liquidate_bull() {
            Some(liquidate_bull) => {
                let outcome = self.trigger_action(liquidate_bull).await;
                (Some(outcome), NextStep::Immediate)
            }
            None => {
                info!(delay_secs = self.stable_delay.as_secs(), "Price is stable");
                (None, NextStep::After(self.stable_delay))
            }
        };

        let report = CycleReport {
            cycle_number,
            quote: obs.quote,
            price_move: obs.price_move,
            trigger: obs.trigger,
            action,
            next,
        };
        self.stats.record(&report);
        log_cycle_report(&report, &self.stats);
        Ok(report)
    }

    async fn trigger_action(&self, liquidate_bull: bool) -> ActionOutcome {
        let action = self.action.name();
        match guarded(async { self.action.execute(liquidate_bull).await }).await {
            Ok(success) => {
                info!(action, liquidate_bull, success, "Action routine finished");
                ActionOutcome::Completed { success }
            }
            Err(reason) => {
                error!(action, liquidate_bull, error = %reason, "Action routine failed, continuing");
                ActionOutcome::Failed { reason }
            }
        }
    }

    /// `action_only` re-entry: call the routine's no-argument form once.
    async fn reenter_action_only(&self) {
        let action = self.action.name();
        info!(action, "Stable delay elapsed, running action routine without a price check");
        match guarded(async { self.action.run().await }).await {
            Ok(()) => info!(action, "Action routine finished"),
            Err(reason) => error!(action, error = %reason, "Action routine failed"),
        }
        warn!("Price monitoring stopped (stable_reentry = action_only)");
    }

    /// Drive cycles until `shutdown` resolves, a price check fails, or the
    /// `action_only` re-entry has run.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<MonitorExit, MonitorError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            source = self.source.name(),
            action = self.action.name(),
            upper = %self.reference.thresholds().upper,
            lower = %self.reference.thresholds().lower,
            stable_delay_secs = self.stable_delay.as_secs(),
            reentry = ?self.reentry,
            "Entering monitor loop"
        );

        loop {
            let report = tokio::select! {
                report = self.run_cycle() => report?,
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    return Ok(MonitorExit::Shutdown);
                }
            };

            let NextStep::After(delay) = report.next else {
                continue;
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    return Ok(MonitorExit::Shutdown);
                }
            }

            if self.reentry == StableReentry::ActionOnly {
                self.reenter_action_only().await;
                return Ok(MonitorExit::Parked);
            }
        }
    }
}

/// Await an action future, turning both errors and panics into a message.
async fn guarded<T>(fut: impl Future<Output = anyhow::Result<T>>) -> Result<T, String> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

fn log_cycle_report(report: &CycleReport, stats: &MonitorStats) {
    let trigger = report.trigger.map(|t| t.to_string()).unwrap_or_default();
    let action_failed = report.action.as_ref().is_some_and(ActionOutcome::is_failure);
    info!(
        cycle = report.cycle_number,
        btc = %report.quote.prices.btc,
        eth = %report.quote.prices.eth,
        price_move = %report.price_move,
        trigger = %trigger,
        action_failed,
        actions_ok = stats.actions_ok,
        actions_failed = stats.actions_failed,
        "Cycle complete"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
