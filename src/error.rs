use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// 401 from the API. The persisted session has already been cleared by
    /// the time this surfaces; navigation is the route guard's job.
    #[error("{0}")]
    Unauthorized(String),

    /// Any other non-2xx response, carrying the server-provided message.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// No response at all (DNS failure, refused connection, dropped socket).
    #[error("Network error: {0}")]
    Network(String),

    /// A session-requiring operation was called without a session.
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// The human-readable message a page renders in its inline error banner.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
