use std::sync::{Mutex, MutexGuard};

use serde::Deserialize;

use crate::api::transport::Method;
use crate::api::ApiClient;
use crate::error::{AppError, AppResult};
use crate::models::cart::{total_items, total_price};
use crate::models::{CartItem, RegisterRequest, Role, UpdateProfileRequest, User};
use crate::storage::{SessionStorageExt, USER_KEY};

/// Token + user pair returned by login and register.
#[derive(Debug, Clone, Deserialize)]
struct AuthPayload {
    token: String,
    user: User,
}

#[derive(Default)]
struct StoreState {
    user: Option<User>,
    is_authenticated: bool,
    loading: bool,
    cart: Vec<CartItem>,
}

/// Point-in-time view of the session, consumed by the route guard.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub loading: bool,
    pub is_authenticated: bool,
    pub role: Option<Role>,
}

/// Sets `loading` for the duration of an auth operation and clears it on
/// drop, so an early return or error can never leave it stuck true.
struct LoadingGuard<'a> {
    state: &'a Mutex<StoreState>,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(state: &'a Mutex<StoreState>) -> Self {
        lock(state).loading = true;
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).loading = false;
    }
}

fn lock(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    // The lock is only ever held for plain field access, never across an
    // await, so poisoning can only come from a panicking reader.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The single shared state container every view reads from: the session
/// (user, auth flag, loading flag) and the cart. All mutations go through
/// the API client and reconcile local state from the server's response;
/// there is no local-merge path.
///
/// Construct one per application (or per test) and share it; nothing here
/// is a global.
pub struct MarketStore {
    api: ApiClient,
    state: Mutex<StoreState>,
}

impl MarketStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    // ---- session reads ----

    pub fn user(&self) -> Option<User> {
        lock(&self.state).user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.state).is_authenticated
    }

    pub fn loading(&self) -> bool {
        lock(&self.state).loading
    }

    pub fn cart(&self) -> Vec<CartItem> {
        lock(&self.state).cart.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = lock(&self.state);
        SessionSnapshot {
            loading: state.loading,
            is_authenticated: state.is_authenticated,
            role: state.user.as_ref().map(|u| u.role),
        }
    }

    // ---- session operations ----

    /// One-time session bootstrap: verify the persisted token against
    /// `/auth/me` and load the cart. Never surfaces an error; a failed check
    /// just leaves the store anonymous.
    pub async fn check_auth(&self) {
        let _loading = LoadingGuard::acquire(&self.state);

        if self.api.storage().token().is_none() {
            self.clear_local_session();
            return;
        }

        match self
            .api
            .request_envelope::<User>(Method::Get, "/auth/me", None)
            .await
        {
            Ok(user) => {
                {
                    let mut state = lock(&self.state);
                    state.user = Some(user);
                    state.is_authenticated = true;
                }
                self.reload_cart().await;
            }
            Err(e) => {
                log::info!("Session check failed: {}", e);
                self.clear_local_session();
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<()> {
        let _loading = LoadingGuard::acquire(&self.state);

        let body = serde_json::json!({"email": email, "password": password});
        let payload = self
            .api
            .request_envelope::<AuthPayload>(
                Method::Post,
                "/auth/login",
                Some(crate::api::RequestBody::Json(body)),
            )
            .await?;

        self.install_session(payload);
        self.reload_cart().await;
        Ok(())
    }

    /// Same contract as [`Self::login`]. The post-register cart load is
    /// best-effort and can never fail the registration result (a fresh
    /// account has no cart anyway).
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<()> {
        let _loading = LoadingGuard::acquire(&self.state);

        let body = serde_json::to_value(request)?;
        let payload = self
            .api
            .request_envelope::<AuthPayload>(
                Method::Post,
                "/auth/register",
                Some(crate::api::RequestBody::Json(body)),
            )
            .await?;

        self.install_session(payload);
        self.reload_cart().await;
        Ok(())
    }

    /// Best-effort remote invalidation, then an unconditional local teardown.
    /// The local session always ends cleared, whatever the server said.
    pub async fn logout(&self) {
        if let Err(e) = self.api.post("/auth/logout", serde_json::json!({})).await {
            log::warn!("Remote logout failed (ignored): {}", e);
        }
        self.api.storage().clear_session();
        self.clear_local_session();
    }

    /// Replaces the user wholesale with the server's returned record; never
    /// a local shallow merge, so server-computed fields can't drift.
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> AppResult<()> {
        if lock(&self.state).user.is_none() {
            return Err(AppError::NotAuthenticated);
        }

        let _loading = LoadingGuard::acquire(&self.state);

        let body = serde_json::to_value(request)?;
        let user = self
            .api
            .request_envelope::<User>(
                Method::Put,
                "/auth/profile",
                Some(crate::api::RequestBody::Json(body)),
            )
            .await?;

        if let Err(e) = self
            .api
            .storage()
            .set(USER_KEY, &serde_json::to_string(&user)?)
        {
            log::warn!("Failed to persist updated user: {}", e);
        }
        lock(&self.state).user = Some(user);
        Ok(())
    }

    // ---- cart operations ----
    // All silent no-ops when unauthenticated: unreachable through the
    // guarded UI, but safe to call directly.

    pub async fn add_to_cart(&self, agent_id: &str) -> AppResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        self.api
            .post(
                "/cart",
                serde_json::json!({"agent_id": agent_id, "quantity": 1}),
            )
            .await?;
        self.reload_cart().await;
        Ok(())
    }

    /// A quantity of zero or less is a removal, never stored.
    pub async fn update_quantity(&self, item_id: &str, quantity: i32) -> AppResult<()> {
        if quantity <= 0 {
            return self.remove_from_cart(item_id).await;
        }
        if !self.is_authenticated() {
            return Ok(());
        }
        self.api
            .put(
                &format!("/cart/{}", item_id),
                serde_json::json!({"quantity": quantity}),
            )
            .await?;
        self.reload_cart().await;
        Ok(())
    }

    pub async fn remove_from_cart(&self, item_id: &str) -> AppResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        self.api.delete(&format!("/cart/{}", item_id)).await?;
        self.reload_cart().await;
        Ok(())
    }

    pub async fn clear_cart(&self) -> AppResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        self.api.delete("/cart").await?;
        // The empty state is already known; no reload round-trip needed.
        lock(&self.state).cart.clear();
        Ok(())
    }

    pub fn total_items(&self) -> u32 {
        total_items(&lock(&self.state).cart)
    }

    pub fn total_price(&self) -> f64 {
        total_price(&lock(&self.state).cart)
    }

    /// Finalize the cart as a purchase. On failure the cart is left
    /// untouched so the user can retry without re-adding items.
    pub async fn complete_purchase(&self) -> AppResult<()> {
        if !self.is_authenticated() {
            return Err(AppError::NotAuthenticated);
        }
        self.api.post("/purchases", serde_json::json!({})).await?;
        lock(&self.state).cart.clear();
        Ok(())
    }

    // ---- internals ----

    fn install_session(&self, payload: AuthPayload) {
        if let Err(e) = self
            .api
            .storage()
            .store_session(&payload.token, &payload.user)
        {
            log::warn!("Failed to persist session: {}", e);
        }
        let mut state = lock(&self.state);
        state.user = Some(payload.user);
        state.is_authenticated = true;
    }

    fn clear_local_session(&self) {
        let mut state = lock(&self.state);
        state.user = None;
        state.is_authenticated = false;
        state.cart.clear();
    }

    /// Fetch the authoritative cart and replace the local copy. Failures are
    /// logged and swallowed; a reload that resolves after the session was
    /// torn down mid-flight is discarded.
    async fn reload_cart(&self) {
        match self
            .api
            .request_envelope::<Vec<CartItem>>(Method::Get, "/cart", None)
            .await
        {
            Ok(items) => {
                let mut state = lock(&self.state);
                if state.is_authenticated {
                    state.cart = items;
                } else {
                    log::debug!("Discarding cart reload after session teardown");
                }
            }
            Err(e) => log::warn!("Cart reload failed: {}", e),
        }
    }
}
