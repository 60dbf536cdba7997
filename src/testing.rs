//! Mock transport for testing.
//!
//! Lets tests (and embedders) drive the API client and store without a
//! network: queue [`MockResponse`]s, then assert against the recorded
//! [`RecordedCall`]s.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::api::transport::{ApiRequest, ApiResponse, HttpTransport, Method, RequestBody};
use crate::error::{AppError, AppResult};

/// One request as the transport saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<RequestBody>,
    pub timestamp: DateTime<Utc>,
}

/// A canned transport outcome.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Response { status: u16, body: Value },
    NetworkFailure,
}

impl MockResponse {
    /// A 200 response with the given JSON body.
    pub fn ok(body: Value) -> Self {
        Self::Response { status: 200, body }
    }

    pub fn status(status: u16, body: Value) -> Self {
        Self::Response { status, body }
    }

    /// Simulates no response at all (connection refused, DNS failure).
    pub fn network_failure() -> Self {
        Self::NetworkFailure
    }
}

/// Transport that replays queued responses in order and records every call.
/// An exhausted queue answers 200 `{"success": true, "data": null}` so
/// incidental follow-up calls (e.g. cart reloads) don't need queuing.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn queue(&self, response: MockResponse) {
        self.responses.lock().await.push_back(response);
    }

    /// Everything sent through this transport, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        self.calls.lock().await.push(RecordedCall {
            method: request.method,
            path: request.path.clone(),
            bearer: request.bearer.clone(),
            body: request.body.clone(),
            timestamp: Utc::now(),
        });

        let next = self.responses.lock().await.pop_front();
        match next {
            Some(MockResponse::Response { status, body }) => Ok(ApiResponse { status, body }),
            Some(MockResponse::NetworkFailure) => {
                Err(AppError::Network("connection refused".into()))
            }
            None => Ok(ApiResponse {
                status: 200,
                body: serde_json::json!({"success": true, "data": null}),
            }),
        }
    }
}

/// Wraps a [`MockTransport`] and, once engaged, parks GET requests to one
/// path until released. Lets a test run other store operations between a
/// request being issued and its response arriving (e.g. a logout racing an
/// in-flight cart reload).
pub struct PausingTransport {
    inner: MockTransport,
    paused_path: String,
    engaged: std::sync::atomic::AtomicBool,
    arrived: tokio::sync::Notify,
    release: tokio::sync::Notify,
}

impl PausingTransport {
    pub fn new(inner: MockTransport, paused_path: impl Into<String>) -> Self {
        Self {
            inner,
            paused_path: paused_path.into(),
            engaged: std::sync::atomic::AtomicBool::new(false),
            arrived: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        }
    }

    pub fn inner(&self) -> &MockTransport {
        &self.inner
    }

    /// Start parking matching requests. Until this is called the transport
    /// passes everything straight through.
    pub fn engage(&self) {
        self.engaged.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Resolves once a matching request has been parked.
    pub async fn wait_until_paused(&self) {
        self.arrived.notified().await;
    }

    /// Let one parked request proceed.
    pub fn release_one(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl HttpTransport for PausingTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let engaged = self.engaged.load(std::sync::atomic::Ordering::SeqCst);
        if engaged && request.method == Method::Get && request.path == self.paused_path {
            self.arrived.notify_one();
            self.release.notified().await;
        }
        self.inner.send(request).await
    }
}
