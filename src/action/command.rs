//! External-command action.
//!
//! Runs a configured program as the arbitrage routine. The direction flag
//! is passed through the `LIQUIDATE_BULL` environment variable (`true` /
//! `false`), and is absent for the no-argument entry point. Exit status 0
//! is success; anything else is an error carrying the tail of stderr.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::ArbitrageAction;
use crate::types::MonitorError;

pub const LIQUIDATE_BULL_ENV: &str = "LIQUIDATE_BULL";

/// Bytes of stderr kept in error messages.
const STDERR_TAIL: usize = 500;

#[derive(Debug, Clone)]
pub struct CommandAction {
    program: String,
    args: Vec<String>,
}

impl CommandAction {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    async fn invoke(&self, liquidate_bull: Option<bool>) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match liquidate_bull {
            Some(flag) => cmd.env(LIQUIDATE_BULL_ENV, flag.to_string()),
            None => cmd.env_remove(LIQUIDATE_BULL_ENV),
        };

        info!(program = %self.program, ?liquidate_bull, "Running action command");

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to spawn action command: {}", self.program))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(program = %self.program, stdout = %stdout.trim(), "Action command output");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let mut start = stderr.len().saturating_sub(STDERR_TAIL);
            while !stderr.is_char_boundary(start) {
                start += 1;
            }
            let tail = &stderr[start..];
            return Err(MonitorError::Action(format!(
                "{} exited with {}: {}",
                self.program, output.status, tail
            ))
            .into());
        }

        Ok(())
    }
}

#[async_trait]
impl ArbitrageAction for CommandAction {
    async fn execute(&self, liquidate_bull: bool) -> Result<bool> {
        self.invoke(Some(liquidate_bull)).await?;
        Ok(true)
    }

    async fn run(&self) -> Result<()> {
        self.invoke(None).await
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
