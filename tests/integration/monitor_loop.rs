//! Monitor loop end to end: real HTTP client, stub price API, recording action.

use arb_monitor::config::{MonitorConfig, PriceSourceConfig, StableReentry};
use arb_monitor::engine::Monitor;
use arb_monitor::prices::coingecko::CoinGeckoClient;
use arb_monitor::types::{MonitorError, MonitorExit, PriceMove, PricePair};
use rust_decimal_macros::dec;

use crate::mock_action::RecordingAction;
use crate::stub_server::{price_body, StubServer};

fn build(server: &StubServer, action: RecordingAction, reentry: StableReentry) -> Monitor {
    let source_cfg = PriceSourceConfig {
        base_url: server.base_url.clone(),
        timeout_secs: 5,
        ..PriceSourceConfig::default()
    };
    let source = CoinGeckoClient::from_config(&source_cfg, None).unwrap();
    let monitor_cfg = MonitorConfig {
        stable_delay_secs: 0,
        stable_reentry: reentry,
        ..MonitorConfig::default()
    };
    Monitor::new(Box::new(source), Box::new(action), &monitor_cfg)
}

#[tokio::test]
async fn test_up_stable_down_then_fetch_failure() {
    let server = StubServer::start(vec![
        (200, price_body("50000", "3000")),
        (200, price_body("50000", "3000")),
        (200, price_body("49000", "3000")),
    ])
    .await;
    let action = RecordingAction::new();
    let mut monitor = build(&server, action.clone(), StableReentry::ResumeMonitoring);

    let result = monitor.run(std::future::pending()).await;

    assert!(matches!(result, Err(MonitorError::PriceSource { .. })));
    assert_eq!(action.calls(), vec![Some(true), Some(false)]);
    assert_eq!(monitor.reference(), PricePair::new(dec!(49000), dec!(3000)));
    assert_eq!(monitor.stats().cycles, 3);
    assert_eq!(server.requests().len(), 4);
}

#[tokio::test]
async fn test_action_failures_do_not_stop_the_loop() {
    let server = StubServer::start(vec![
        (200, price_body("50000", "3000")),
        (200, price_body("40000", "3000")),
        (200, price_body("40000", "3500")),
    ])
    .await;
    let action = RecordingAction::new();
    action.set_error("order rejected");
    let mut monitor = build(&server, action.clone(), StableReentry::ResumeMonitoring);

    let result = monitor.run(std::future::pending()).await;

    assert!(result.is_err());
    assert_eq!(action.calls(), vec![Some(true), Some(false), Some(true)]);
    assert_eq!(monitor.stats().actions_failed, 3);
    assert_eq!(monitor.stats().actions_ok, 0);
}

#[tokio::test]
async fn test_action_only_reentry_stops_checking() {
    let server = StubServer::start(vec![
        (200, price_body("50000", "3000")),
        (200, price_body("50100", "3010")),
        (200, price_body("99999", "9999")),
    ])
    .await;
    let action = RecordingAction::new();
    let mut monitor = build(&server, action.clone(), StableReentry::ActionOnly);

    let exit = monitor.run(std::future::pending()).await.unwrap();

    assert_eq!(exit, MonitorExit::Parked);
    assert_eq!(action.calls(), vec![Some(true), None]);
    // The third scripted price is never requested
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_check_prices_against_stub() {
    let server = StubServer::start(vec![
        (200, price_body("50000", "3000")),
        (200, price_body("50800", "3000")),
        (200, price_body("50800", "2900")),
    ])
    .await;
    let mut monitor = build(&server, RecordingAction::new(), StableReentry::ResumeMonitoring);

    assert_eq!(monitor.check_prices().await.unwrap(), PriceMove::Up);
    assert_eq!(monitor.check_prices().await.unwrap(), PriceMove::Up);
    assert_eq!(monitor.reference(), PricePair::new(dec!(50800), dec!(3000)));
    assert_eq!(monitor.check_prices().await.unwrap(), PriceMove::Down);
    assert_eq!(monitor.reference(), PricePair::new(dec!(50800), dec!(2900)));
}
