//! Integration tests: the real CoinGecko client against a local stub,
//! and the monitor loop end to end.

mod coingecko_stub;
mod mock_action;
mod monitor_loop;
mod stub_server;
