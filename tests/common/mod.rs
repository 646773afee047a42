//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use mimir_client::config::Config;
use mimir_client::error::{Error, Result};
use mimir_client::http::{HttpRequest, RawResponse, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// What the fake network does for one exchange.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Complete the exchange with this status and raw body.
    Respond(u16, String),
    /// Fail to complete the exchange.
    Fail,
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Reply::Respond(status, body.to_string())
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Reply::Respond(status, body.to_string())
    }
}

/// Plays queued replies in order, then repeats the fallback reply.
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Reply>,
    seen: Mutex<Vec<(HttpRequest, Instant)>>,
}

impl ScriptedTransport {
    pub fn always(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(reply),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Self::always(Reply::Fail)
    }

    pub fn then(self: &Arc<Self>, reply: Reply) -> Arc<Self> {
        self.queue.lock().unwrap().push_back(reply);
        Arc::clone(self)
    }

    pub fn set_fallback(&self, reply: Reply) {
        *self.fallback.lock().unwrap() = reply;
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }

    pub fn request_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.seen.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<RawResponse> {
        self.seen
            .lock()
            .unwrap()
            .push((request.clone(), Instant::now()));

        let reply = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.lock().unwrap().clone());

        match reply {
            Reply::Respond(status, body) => Ok(RawResponse { status, body }),
            Reply::Fail => Err(Error::TransportMessage("connection refused".to_string())),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        api_base_url: "http://mimir.test".to_string(),
        ..Config::default()
    }
}

pub fn mock_config() -> Config {
    Config {
        use_mocks: true,
        ..test_config()
    }
}
