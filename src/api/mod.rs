pub mod client;
pub mod transport;

pub use client::{ApiClient, ApiEnvelope};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport, RequestBody};
