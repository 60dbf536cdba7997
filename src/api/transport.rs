use async_trait::async_trait;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Request payload. JSON bodies get a JSON content type; raw bodies (file
/// uploads) are sent unmodified with no content type set, leaving the
/// multipart boundary to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Raw(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<RequestBody>,
}

/// A raw response: status plus the decoded JSON body. An unparseable body
/// decodes to JSON `null` so error extraction can still run on the status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The seam between the API client and the wire. The production impl is
/// [`ReqwestTransport`]; tests inject [`crate::testing::MockTransport`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse>;
}

/// Production transport over `reqwest`. No retries, no timeout, no queuing:
/// every call is a single shot and resilience lives with the caller.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        match request.body {
            Some(RequestBody::Json(value)) => {
                builder = builder.json(&value);
            }
            Some(RequestBody::Raw(bytes)) => {
                builder = builder.body(bytes);
            }
            None => {}
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        Ok(ApiResponse { status, body })
    }
}
