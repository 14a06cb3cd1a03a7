//! ARB-MONITOR — BTC/ETH price-move watcher.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod prices;
pub mod action;
pub mod engine;
