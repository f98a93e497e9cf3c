use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use codeguard_core::{Error, Result};

use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// Replays responses queued per method and path, and records every request
/// it saw. An exchange with nothing queued fails as a transport error.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<(Method, String), VecDeque<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(ApiResponse {
                status,
                body: body.to_string(),
            });
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let key = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);
        // Let concurrently polled futures run, like a real round trip would.
        tokio::task::yield_now().await;
        self.responses
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| Error::Transport(format!("no response queued for {} {}", key.0, key.1)))
    }
}
