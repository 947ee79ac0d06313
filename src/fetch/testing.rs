//! Canned [`HttpClient`] for exercising request paths without a network.

use super::HttpClient;
use async_trait::async_trait;
use reqwest::{Request, Response, Url};
use std::sync::Mutex;

/// Answers every request with the same status and body and remembers the
/// URLs it was asked for.
pub struct CannedClient {
    status: u16,
    body: String,
    pub requests: Mutex<Vec<Url>>,
}

impl CannedClient {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.to_string())
            .collect()
    }
}

#[async_trait]
impl HttpClient for CannedClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.requests.lock().unwrap().push(req.url().clone());
        let resp = http::Response::builder()
            .status(self.status)
            .body(self.body.clone())
            .unwrap();
        Ok(Response::from(resp))
    }
}
