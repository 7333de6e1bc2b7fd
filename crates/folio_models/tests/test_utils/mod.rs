//! Test utilities for provider adapter tests.
//!
//! An axum responder that replays canned responses in order and records
//! every request, so adapters can be exercised end to end without a real
//! provider.

#![allow(dead_code)]

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, Version, header},
    response::{IntoResponse, Response},
};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// A recorded request.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Request line, e.g. "POST /v1/chat/completions HTTP/1.1"
    pub line: String,
    /// Headers as "name: value" lines, lowercased
    pub headers: String,
    /// Request body
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Vec<(u16, String)>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// Canned HTTP server.
pub struct MockServer {
    /// Base URL including scheme and port
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    /// Start serving `responses` in order; after the last one the final
    /// response repeats.
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        assert!(!responses.is_empty(), "MockServer needs at least one response");
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let url = format!(
            "http://{}",
            listener.local_addr().expect("Mock server has an address")
        );

        let state = MockState {
            responses: Arc::new(responses),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = Arc::clone(&state.requests);
        let app = Router::new().fallback(respond).with_state(state);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock server stopped");
        });

        Self { url, requests }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let headers = headers
        .iter()
        .map(|(name, value)| format!("{}: {}\r\n", name, value.to_str().unwrap_or_default()))
        .collect::<String>()
        .to_lowercase();

    let (status, reply) = {
        let mut requests = state.requests.lock().unwrap();
        let index = requests.len().min(state.responses.len() - 1);
        requests.push(Recorded {
            line: format!("{} {} {:?}", method, uri, version),
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        });
        state.responses[index].clone()
    };

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply).into_response()
}

/// An OpenAI chat completion body with the given text.
pub fn chat_body(text: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": text}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5}
    })
    .to_string()
}
