//! Scripted upstream for tests and local demos.
//!
//! [`ScriptedTransport`] answers GETs from a queue of canned replies and
//! records every URL it was asked for. Public only so integration tests can
//! reach it; not part of the supported API.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;

use crate::fetch::{HttpResponse, Transport, TransportError};

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    NetworkError,
    /// Never completes; used to hold a request in flight.
    Hang,
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Reply>,
    requests: Vec<String>,
}

#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
    fallback: Reply,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Empty script; unscripted requests fail with a network error.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            fallback: Reply::NetworkError,
        }
    }

    pub fn push_json<B: Serialize>(self, status: u16, body: &B) -> Self {
        let body = serde_json::to_string(body).unwrap_or_default();
        self.push(Reply::Response(HttpResponse::new(status, body)))
    }

    pub fn push_raw(self, status: u16, body: &str) -> Self {
        self.push(Reply::Response(HttpResponse::new(status, body)))
    }

    pub fn push_status(self, status: u16) -> Self {
        self.push_raw(status, "")
    }

    pub fn push_network_error(self) -> Self {
        self.push(Reply::NetworkError)
    }

    pub fn push_hang(self) -> Self {
        self.push(Reply::Hang)
    }

    /// Reply used once the queue is drained.
    pub fn with_fallback(mut self, status: u16, body: &str) -> Self {
        self.fallback = Reply::Response(HttpResponse::new(status, body));
        self
    }

    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    /// Every requested URL, in order.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    fn push(self, reply: Reply) -> Self {
        self.lock().replies.push_back(reply);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // A panicking test thread must not hide the script from the others.
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let reply = {
            let mut script = self.lock();
            script.requests.push(url.to_string());
            script
                .replies
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        };

        match reply {
            Reply::Response(response) => Ok(response),
            Reply::NetworkError => Err(TransportError::Unavailable(
                "scripted network error".to_string(),
            )),
            Reply::Hang => std::future::pending().await,
        }
    }
}
