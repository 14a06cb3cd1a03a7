//! Arbitrage action routine.
//!
//! The routine itself (what it trades, with which credentials) lives
//! outside this crate. `ArbitrageAction` is the contract the monitor
//! calls through:
//! - `execute(liquidate_bull)` after a qualifying price move
//! - `run()` as the delayed re-entry target in `action_only` mode
//!
//! Two adapters are provided: `CommandAction` shells out to an external
//! program, `DryRunAction` only logs.

pub mod command;
pub mod dry_run;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::ActionConfig;

pub use command::CommandAction;
pub use dry_run::DryRunAction;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArbitrageAction: Send + Sync {
    /// Run the routine for a price move. `liquidate_bull` is `true` after an
    /// up move and `false` after a down move; its meaning belongs to the
    /// routine. Returns the routine's own success indicator.
    async fn execute(&self, liquidate_bull: bool) -> Result<bool>;

    /// Run the routine with no direction.
    async fn run(&self) -> Result<()>;

    /// Adapter name for logging.
    fn name(&self) -> &'static str;
}

/// Pick the adapter described by the `[action]` config section.
///
/// Falls back to dry-run when no program is configured.
pub fn from_config(cfg: &ActionConfig) -> Box<dyn ArbitrageAction> {
    match (&cfg.program, cfg.dry_run) {
        (Some(program), false) => {
            info!(program = %program, args = ?cfg.args, "Using external action command");
            Box::new(CommandAction::new(program.clone(), cfg.args.clone()))
        }
        (Some(program), true) => {
            info!(program = %program, "Action command configured but dry_run is set");
            Box::new(DryRunAction::new())
        }
        (None, _) => {
            info!("No action command configured, running in dry-run mode");
            Box::new(DryRunAction::new())
        }
    }
}
