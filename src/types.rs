//! Shared types for the ARB-MONITOR daemon.
//!
//! These types form the data model used across all modules so that the
//! price source, action adapters, and engine can depend on them without
//! circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

/// The two watched assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Btc,
    Eth,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Btc => write!(f, "BTC"),
            Asset::Eth => write!(f, "ETH"),
        }
    }
}

/// A BTC/ETH pair of USD prices.
///
/// Used both for the reference baseline and for a freshly fetched quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricePair {
    pub btc: Decimal,
    pub eth: Decimal,
}

impl PricePair {
    pub fn new(btc: Decimal, eth: Decimal) -> Self {
        Self { btc, eth }
    }

    pub fn get(&self, asset: Asset) -> Decimal {
        match asset {
            Asset::Btc => self.btc,
            Asset::Eth => self.eth,
        }
    }
}

impl fmt::Display for PricePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BTC ${} | ETH ${}", self.btc, self.eth)
    }
}

/// A price reading produced by a `PriceSource`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub prices: PricePair,
    pub fetched_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(btc: Decimal, eth: Decimal) -> Self {
        Self {
            prices: PricePair::new(btc, eth),
            fetched_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Verdict of a single price check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceMove {
    Up,
    Down,
    Stable,
}

impl PriceMove {
    /// Direction flag handed to the action routine. `None` when stable.
    pub fn liquidate_bull(&self) -> Option<bool> {
        match self {
            PriceMove::Up => Some(true),
            PriceMove::Down => Some(false),
            PriceMove::Stable => None,
        }
    }
}

impl fmt::Display for PriceMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceMove::Up => write!(f, "up"),
            PriceMove::Down => write!(f, "down"),
            PriceMove::Stable => write!(f, "stable"),
        }
    }
}

/// The threshold crossing that produced a non-stable verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTrigger {
    pub asset: Asset,
    pub direction: PriceMove,
    pub previous: Decimal,
    pub current: Decimal,
}

impl MoveTrigger {
    /// Percentage change from `previous` to `current`, or `None` when the
    /// baseline is zero (first observation).
    pub fn change_pct(&self) -> Option<Decimal> {
        if self.previous.is_zero() {
            return None;
        }
        Some((self.current - self.previous) / self.previous * Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for MoveTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.change_pct() {
            Some(pct) => write!(
                f,
                "{} {} {} -> {} ({:+.2}%)",
                self.asset, self.direction, self.previous, self.current, pct
            ),
            None => write!(
                f,
                "{} {} {} -> {} (no baseline)",
                self.asset, self.direction, self.previous, self.current
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// What the loop does after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Re-check right away (an action just ran).
    Immediate,
    /// Sleep, then re-enter.
    After(Duration),
}

/// Result of invoking the action routine within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// Routine returned normally with its own success indicator.
    Completed { success: bool },
    /// Routine failed; the error was logged and suppressed.
    Failed { reason: String },
}

impl ActionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ActionOutcome::Failed { .. })
    }
}

/// Summary of a single fetch → classify → act cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub quote: PriceQuote,
    pub price_move: PriceMove,
    pub trigger: Option<MoveTrigger>,
    pub action: Option<ActionOutcome>,
    pub next: NextStep,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle #{}: {} move={}",
            self.cycle_number, self.quote.prices, self.price_move
        )?;
        if let Some(trigger) = &self.trigger {
            write!(f, " [{trigger}]")?;
        }
        match &self.action {
            Some(ActionOutcome::Completed { success }) => write!(f, " action=ok({success})")?,
            Some(ActionOutcome::Failed { reason }) => write!(f, " action=failed({reason})")?,
            None => {}
        }
        match self.next {
            NextStep::Immediate => write!(f, " next=now"),
            NextStep::After(d) => write!(f, " next=+{}s", d.as_secs()),
        }
    }
}

/// Running counters over the lifetime of the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStats {
    pub cycles: u64,
    pub up_moves: u64,
    pub down_moves: u64,
    pub stable_cycles: u64,
    pub actions_ok: u64,
    pub actions_failed: u64,
    pub started_at: DateTime<Utc>,
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self {
            cycles: 0,
            up_moves: 0,
            down_moves: 0,
            stable_cycles: 0,
            actions_ok: 0,
            actions_failed: 0,
            started_at: Utc::now(),
        }
    }
}

impl MonitorStats {
    /// Fold a finished cycle into the counters.
    pub fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        match report.price_move {
            PriceMove::Up => self.up_moves += 1,
            PriceMove::Down => self.down_moves += 1,
            PriceMove::Stable => self.stable_cycles += 1,
        }
        match &report.action {
            Some(ActionOutcome::Completed { .. }) => self.actions_ok += 1,
            Some(ActionOutcome::Failed { .. }) => self.actions_failed += 1,
            None => {}
        }
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

/// Why `Monitor::run` returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// Shutdown signal received.
    Shutdown,
    /// `action_only` re-entry ran; threshold checking has stopped.
    Parked,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for ARB-MONITOR.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Price source error ({source_name}): {message}")]
    PriceSource { source_name: String, message: String },

    #[error("Malformed price response: {0}")]
    MalformedQuote(String),

    #[error("Action routine error: {0}")]
    Action(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
