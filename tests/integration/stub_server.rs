//! Local stand-in for the CoinGecko `simple/price` endpoint.
//!
//! Serves a scripted list of responses in order (503 once exhausted) and
//! records the headers and query of every request.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct StubState {
    responses: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct StubServer {
    pub base_url: String,
    state: StubState,
}

impl StubServer {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let state = StubState::default();
        {
            let mut queue = state.responses.lock().unwrap();
            for (status, body) in responses {
                queue.push_back((StatusCode::from_u16(status).unwrap(), body));
            }
        }

        let app = Router::new()
            .route("/api/v3/simple/price", get(simple_price))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api/v3"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

pub fn price_body(btc: &str, eth: &str) -> String {
    format!(r#"{{"bitcoin":{{"usd":{btc}}},"ethereum":{{"usd":{eth}}}}}"#)
}

async fn simple_price(
    State(state): State<StubState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { headers, query });

    state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::SERVICE_UNAVAILABLE, "exhausted".to_string()))
}
