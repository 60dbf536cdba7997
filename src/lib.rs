pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod storage;
pub mod store;
pub mod testing;
pub mod wishlist;

use std::sync::Arc;

pub use api::{ApiClient, ApiEnvelope, ReqwestTransport};
pub use config::ClientConfig;
pub use error::{AppError, AppResult};
pub use guard::{evaluate, GuardDecision, RequiredRole};
pub use models::{Agent, CartItem, Role, User};
pub use store::{MarketStore, SessionSnapshot};

/// Build a production store: reqwest transport + file-backed session
/// storage. Call [`MarketStore::check_auth`] once at startup to bootstrap
/// the session before the router renders anything guarded.
pub fn build_store(config: &ClientConfig) -> AppResult<MarketStore> {
    let storage = Arc::new(storage::FileStorage::new()?);
    let transport = Arc::new(ReqwestTransport::new(config));
    Ok(MarketStore::new(ApiClient::new(transport, storage)))
}
