use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::transport::{ApiRequest, HttpTransport, Method, RequestBody};
use crate::error::{AppError, AppResult};
use crate::storage::{SessionStorage, SessionStorageExt};

const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

/// The `{ success, data, message }` envelope every AgentMart endpoint wraps
/// its payload in. Failed operations carry their text under either
/// `message` or `error` depending on the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// The single choke point for outbound calls. Attaches the bearer token,
/// normalizes the error shape, and clears the persisted session on a 401.
/// Carries no business logic and no retry/timeout machinery.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    storage: Arc<dyn SessionStorage>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { transport, storage }
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Issue a request and return the decoded JSON body. Callers interpret
    /// the envelope; see [`Self::request_envelope`] for the typed variant.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> AppResult<Value> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            bearer: self.storage.token(),
            body,
        };

        let response = self.transport.send(request).await.map_err(|e| match e {
            AppError::Network(msg) => {
                log::warn!("{} {} failed: {}", method.as_str(), path, msg);
                AppError::Network(msg)
            }
            other => other,
        })?;

        if response.is_success() {
            return Ok(response.body);
        }

        let message = extract_message(&response.body);
        if response.status == 401 {
            // Side effect only. Navigation is decided by the route guard on
            // the next render, never from deep inside a call stack.
            log::info!("401 from {} {}, clearing persisted session", method.as_str(), path);
            self.storage.clear_session();
            return Err(AppError::Unauthorized(message));
        }

        Err(AppError::Api {
            status: response.status,
            message,
        })
    }

    /// Issue a request and deserialize the response envelope's `data` field.
    /// An envelope with `success: false` or missing data becomes an error
    /// carrying the server message.
    pub async fn request_envelope<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> AppResult<T> {
        let raw = self.request(method, path, body).await?;
        let ApiEnvelope {
            success,
            data,
            message,
            error,
        } = serde_json::from_value::<ApiEnvelope<T>>(raw)?;
        if !success {
            return Err(AppError::Api {
                status: 200,
                message: envelope_error_text(message, error),
            });
        }
        data.ok_or_else(|| AppError::Api {
            status: 200,
            message: envelope_error_text(message, error),
        })
    }

    pub async fn get(&self, path: &str) -> AppResult<Value> {
        self.request(Method::Get, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> AppResult<Value> {
        self.request(Method::Post, path, Some(RequestBody::Json(body)))
            .await
    }

    pub async fn put(&self, path: &str, body: Value) -> AppResult<Value> {
        self.request(Method::Put, path, Some(RequestBody::Json(body)))
            .await
    }

    pub async fn delete(&self, path: &str) -> AppResult<Value> {
        self.request(Method::Delete, path, None).await
    }

    /// Send bytes unmodified (file uploads). No JSON content type is set.
    pub async fn post_raw(&self, path: &str, bytes: Vec<u8>) -> AppResult<Value> {
        self.request(Method::Post, path, Some(RequestBody::Raw(bytes)))
            .await
    }
}

/// Envelope text for a failed operation: `message` first, then `error`,
/// then the generic fallback.
fn envelope_error_text(message: Option<String>, error: Option<String>) -> String {
    message
        .or(error)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| GENERIC_ERROR.into())
}

/// Pull the human-readable message out of an error body, falling back to a
/// generic one when the server sent nothing usable.
fn extract_message(body: &Value) -> String {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_ERROR.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use crate::storage::MemoryStorage;
    use crate::testing::{MockResponse, MockTransport};

    fn sample_user() -> User {
        User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: Role::Customer,
            verified: true,
            avatar: None,
        }
    }

    fn client_with(
        responses: Vec<MockResponse>,
    ) -> (ApiClient, Arc<MockTransport>, Arc<MemoryStorage>) {
        let transport = Arc::new(MockTransport::with_responses(responses));
        let storage = Arc::new(MemoryStorage::new());
        let client = ApiClient::new(transport.clone(), storage.clone());
        (client, transport, storage)
    }

    #[tokio::test]
    async fn test_attaches_bearer_when_token_present() {
        let (client, transport, storage) =
            client_with(vec![MockResponse::ok(serde_json::json!({"success": true}))]);
        storage.store_session("tok-1", &sample_user()).unwrap();

        client.get("/cart").await.unwrap();

        let calls = transport.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].bearer.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_omits_bearer_without_token() {
        let (client, transport, _storage) =
            client_with(vec![MockResponse::ok(serde_json::json!({}))]);

        client.get("/agents").await.unwrap();

        assert!(transport.calls().await[0].bearer.is_none());
    }

    #[tokio::test]
    async fn test_401_clears_persisted_session() {
        let (client, _transport, storage) = client_with(vec![MockResponse::status(
            401,
            serde_json::json!({"message": "Token expired"}),
        )]);
        storage.store_session("tok-1", &sample_user()).unwrap();

        let err = client.get("/auth/me").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(err.message(), "Token expired");
        assert!(storage.token().is_none());
        assert!(storage.user().is_none());
    }

    #[tokio::test]
    async fn test_error_message_falls_back_to_generic() {
        let (client, _transport, _storage) =
            client_with(vec![MockResponse::status(500, Value::Null)]);

        let err = client.get("/agents").await.unwrap_err();
        assert_eq!(err.message(), GENERIC_ERROR);
    }

    #[tokio::test]
    async fn test_validation_error_carries_server_message() {
        let (client, _transport, _storage) = client_with(vec![MockResponse::status(
            422,
            serde_json::json!({"message": "Email already taken"}),
        )]);

        let err = client
            .post("/auth/register", serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            AppError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Email already taken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_failure_surfaces_as_network_error() {
        let (client, _transport, _storage) = client_with(vec![MockResponse::network_failure()]);

        let err = client.get("/cart").await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }

    #[tokio::test]
    async fn test_envelope_error_key_carries_message() {
        let (client, _transport, _storage) = client_with(vec![MockResponse::ok(
            serde_json::json!({"success": false, "error": "Invalid credentials"}),
        )]);

        let err = client
            .request_envelope::<User>(Method::Post, "/auth/login", None)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_envelope_prefers_message_over_error_key() {
        let (client, _transport, _storage) = client_with(vec![MockResponse::ok(
            serde_json::json!({"success": false, "message": "Email already taken", "error": "E_DUP"}),
        )]);

        let err = client
            .request_envelope::<User>(Method::Post, "/auth/register", None)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Email already taken");
    }

    #[tokio::test]
    async fn test_raw_body_passes_through_unmodified() {
        let (client, transport, _storage) =
            client_with(vec![MockResponse::ok(serde_json::json!({"success": true}))]);

        let bytes = vec![0xde, 0xad, 0xbe, 0xef];
        client.post_raw("/upload", bytes.clone()).await.unwrap();

        let calls = transport.calls().await;
        assert_eq!(calls[0].body, Some(RequestBody::Raw(bytes)));
    }

    #[tokio::test]
    async fn test_envelope_success_false_becomes_error() {
        let (client, _transport, _storage) = client_with(vec![MockResponse::ok(
            serde_json::json!({"success": false, "message": "Invalid credentials"}),
        )]);

        let err = client
            .request_envelope::<User>(Method::Post, "/auth/login", None)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Invalid credentials");
    }
}
