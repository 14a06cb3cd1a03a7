//! Mock action routine for integration testing.
//!
//! Records every call in memory. Failures can be forced from test code.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use arb_monitor::action::ArbitrageAction;

/// One recorded invocation. `None` is the no-argument entry point.
pub type Call = Option<bool>;

#[derive(Clone, Default)]
pub struct RecordingAction {
    calls: Arc<Mutex<Vec<Call>>>,
    /// If set, every call fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
}

impl RecordingAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.force_error.lock().unwrap().as_ref() {
            Some(msg) => Err(anyhow!(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ArbitrageAction for RecordingAction {
    async fn execute(&self, liquidate_bull: bool) -> Result<bool> {
        self.record(Some(liquidate_bull))?;
        Ok(true)
    }

    async fn run(&self) -> Result<()> {
        self.record(None)
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
