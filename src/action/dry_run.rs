//! Dry-run action: logs what would have been triggered.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use super::ArbitrageAction;

#[derive(Debug, Default)]
pub struct DryRunAction {
    invocations: AtomicU64,
}

impl DryRunAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times either entry point was called.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ArbitrageAction for DryRunAction {
    async fn execute(&self, liquidate_bull: bool) -> Result<bool> {
        let n = self.invocations.fetch_add(1, Ordering::Relaxed) + 1;
        info!(liquidate_bull, invocation = n, "[DRY RUN] Would run arbitrage routine");
        Ok(true)
    }

    async fn run(&self) -> Result<()> {
        let n = self.invocations.fetch_add(1, Ordering::Relaxed) + 1;
        info!(invocation = n, "[DRY RUN] Would run arbitrage routine (no direction)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
