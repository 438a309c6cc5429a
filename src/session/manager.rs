//! Session lifecycle.
//!
//! # Responsibilities
//! - Login, register, logout and current-user refresh against the backend
//! - Persist the bearer token under a single key in the `TokenStore`
//! - Hold the current `Session` and announce every transition exactly once
//!
//! # Design Decisions
//! - Only this type mutates session state; everyone else reads the token
//!   through `token()` at call time
//! - Token store failures are logged and treated as "no token"
//! - Transitions are serialized so concurrent 401s notify once

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::api::models::{LoginRequest, LoginResponse, RegisterRequest, Session, User};
use crate::api::wire;
use crate::gateway::{GatewayRequest, ResilientGateway};
use crate::session::notifier::{ListenerId, SessionNotifier};
use crate::session::token_store::TokenStore;
use crate::session::types::SessionError;

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Owns the authenticated session.
pub struct SessionManager {
    gateway: Arc<ResilientGateway>,
    store: Arc<dyn TokenStore>,
    current: ArcSwapOption<Session>,
    notifier: SessionNotifier,
    transition: Mutex<()>,
}

impl SessionManager {
    pub fn new(gateway: Arc<ResilientGateway>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            gateway,
            store,
            current: ArcSwapOption::empty(),
            notifier: SessionNotifier::new(),
            transition: Mutex::new(()),
        }
    }

    // --- Observers ---

    /// Register a callback invoked with the new user (or `None`) on every transition.
    pub fn on_session_changed<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        self.notifier.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    /// Channel-based alternative to `on_session_changed`.
    pub fn subscribe(&self) -> broadcast::Receiver<Option<User>> {
        self.notifier.subscribe()
    }

    // --- State ---

    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.current.load_full()
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.load_full().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.load().is_some()
    }

    /// Read the stored token. Store failures count as absent.
    pub async fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Token store read failed, treating token as absent");
                None
            }
        }
    }

    // --- Operations ---

    /// Authenticate and establish a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, SessionError> {
        if username.trim().is_empty() {
            return Err(SessionError::Validation("username is required"));
        }
        if password.is_empty() {
            return Err(SessionError::Validation("password is required"));
        }

        let request = GatewayRequest::post("api/login").json(&LoginRequest { username, password })?;
        let response = self.gateway.execute(request).await?;

        if !response.is_success() {
            tracing::warn!(status = response.status, username = %username, "Login rejected");
            return Err(SessionError::Rejected {
                status: response.status,
                payload: response.body,
            });
        }

        let login: LoginResponse =
            wire::decode(&response.body).map_err(|e| SessionError::Decode(e.to_string()))?;
        if login.token.is_empty() {
            return Err(SessionError::Decode("login response carried no token".into()));
        }

        let session = Session {
            token: login.token,
            user: login.user,
        };

        let _guard = self.transition.lock().await;
        self.persist_token(&session.token).await;
        self.current.store(Some(Arc::new(session.clone())));
        self.notifier.notify(Some(&session.user));

        tracing::info!(user_id = session.user.id, username = %session.user.username, "Logged in");
        Ok(session)
    }

    /// Create an account. Does not log in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> bool {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            tracing::warn!("Registration rejected locally: missing required field");
            return false;
        }

        let body = RegisterRequest {
            username,
            email,
            password,
            password_confirmation,
        };
        let request = match GatewayRequest::post("api/register").json(&body) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build registration request");
                return false;
            }
        };

        match self.gateway.execute(request).await {
            Ok(response) if response.is_success() => {
                tracing::info!(username = %username, "Registered");
                true
            }
            Ok(response) => {
                tracing::warn!(status = response.status, body = %response.body, "Registration rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registration failed");
                false
            }
        }
    }

    /// End the session. The server call is best-effort; local state is always cleared.
    pub async fn logout(&self) {
        let _guard = self.transition.lock().await;

        if let Some(token) = self.token().await {
            let request = GatewayRequest::post("api/logout").bearer(Some(token));
            match self.gateway.execute(request).await {
                Ok(response) if response.is_success() => {
                    tracing::debug!("Server-side logout acknowledged");
                }
                Ok(response) => {
                    tracing::warn!(status = response.status, "Server-side logout rejected");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Server-side logout failed");
                }
            }
        }

        self.clear_local().await;
        self.notifier.notify(None);
        tracing::info!("Logged out");
    }

    /// Re-fetch the profile for the stored token.
    ///
    /// A 401 clears the session. Any other failure leaves state untouched.
    pub async fn refresh_current_user(&self) -> Option<User> {
        let token = self.token().await?;

        let request = GatewayRequest::get("api/user").bearer(Some(token.clone()));
        let response = match self.gateway.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Current user refresh failed");
                return None;
            }
        };

        if response.is_unauthorized() {
            tracing::info!("Token rejected by backend, clearing session");
            self.invalidate(&token).await;
            return None;
        }
        if !response.is_success() {
            tracing::warn!(status = response.status, "Current user refresh rejected");
            return None;
        }

        let user: User = match wire::decode(&response.body) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Current user response could not be decoded");
                return None;
            }
        };

        let _guard = self.transition.lock().await;
        if self.token().await.as_deref() != Some(token.as_str()) {
            tracing::debug!("Session changed during refresh, discarding result");
            return None;
        }
        self.current.store(Some(Arc::new(Session {
            token,
            user: user.clone(),
        })));
        self.notifier.notify(Some(&user));

        Some(user)
    }

    /// Clear the session because the backend rejected `rejected_token`.
    ///
    /// Does nothing if the stored token has changed since, so a late 401 for
    /// an old token cannot end a newer session.
    pub async fn invalidate(&self, rejected_token: &str) {
        let _guard = self.transition.lock().await;

        if self.token().await.as_deref() != Some(rejected_token) {
            tracing::debug!("Rejected token is no longer current, nothing to invalidate");
            return;
        }

        self.clear_local().await;
        self.notifier.notify(None);
        tracing::info!("Session invalidated");
    }

    async fn persist_token(&self, token: &str) {
        if let Err(e) = self.store.set(TOKEN_KEY, token).await {
            tracing::warn!(error = %e, "Failed to persist token");
        }
    }

    async fn clear_local(&self) {
        if let Err(e) = self.store.remove(TOKEN_KEY).await {
            tracing::warn!(error = %e, "Failed to remove stored token");
        }
        self.current.store(None);
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("current", &self.current_session())
            .field("notifier", &self.notifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{plain_gateway, MockReply, MockTransport};
    use crate::session::token_store::{MemoryTokenStore, UnavailableTokenStore};
    use reqwest::Method;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    struct Fixture {
        transport: Arc<MockTransport>,
        store: Arc<MemoryTokenStore>,
        manager: SessionManager,
        notifications: Arc<StdMutex<Vec<Option<i64>>>>,
    }

    fn fixture() -> Fixture {
        let transport = MockTransport::new();
        let store = Arc::new(MemoryTokenStore::new());
        let manager = SessionManager::new(plain_gateway(transport.clone()), store.clone());

        let notifications = Arc::new(StdMutex::new(Vec::new()));
        let n = notifications.clone();
        manager.on_session_changed(move |user| n.lock().unwrap().push(user.map(|u| u.id)));

        Fixture {
            transport,
            store,
            manager,
            notifications,
        }
    }

    fn login_ok() -> MockReply {
        MockReply::json(
            200,
            json!({ "token": "tok-1", "user": { "id": 7, "username": "ana", "email": "ana@x.io" } }),
        )
    }

    #[tokio::test]
    async fn test_login_rejects_empty_fields_locally() {
        let f = fixture();
        assert!(matches!(
            f.manager.login("", "x").await,
            Err(SessionError::Validation(_))
        ));
        assert!(matches!(
            f.manager.login("x", "").await,
            Err(SessionError::Validation(_))
        ));
        assert_eq!(f.transport.call_count(), 0);
        assert!(f.notifications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_success_persists_and_notifies() {
        let f = fixture();
        f.transport.reply(Method::POST, "api/login", login_ok());

        let session = f.manager.login("ana", "pw").await.unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.user.username, "ana");

        assert_eq!(f.store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok-1"));
        assert_eq!(f.manager.current_user().map(|u| u.id), Some(7));
        assert_eq!(*f.notifications.lock().unwrap(), vec![Some(7)]);

        let body = f.transport.calls()[0].body.clone().unwrap();
        assert_eq!(body, json!({ "username": "ana", "password": "pw" }));
        assert!(f.transport.calls()[0].token.is_none());
    }

    #[tokio::test]
    async fn test_login_rejected_leaves_session_untouched() {
        let f = fixture();
        f.transport.reply(
            Method::POST,
            "api/login",
            MockReply::json(401, json!({ "error": "invalid credentials" })),
        );

        let err = f.manager.login("ana", "wrong").await.unwrap_err();
        match err {
            SessionError::Rejected { status, payload } => {
                assert_eq!(status, 401);
                assert!(payload.contains("invalid credentials"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!f.manager.is_authenticated());
        assert!(f.store.get(TOKEN_KEY).await.unwrap().is_none());
        assert!(f.notifications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_accepts_pascal_case_response() {
        let f = fixture();
        f.transport.reply(
            Method::POST,
            "api/login",
            MockReply::json(200, json!({ "Token": "T", "User": { "Id": 3, "Username": "bo", "Email": "b@x.io" } })),
        );

        let session = f.manager.login("bo", "pw").await.unwrap();
        assert_eq!(session.token, "T");
        assert_eq!(session.user.id, 3);
    }

    #[tokio::test]
    async fn test_register() {
        let f = fixture();
        assert!(!f.manager.register("", "a@x.io", "pw", "pw").await);
        assert!(!f.manager.register("ana", "", "pw", "pw").await);
        assert!(!f.manager.register("ana", "a@x.io", "", "").await);
        assert_eq!(f.transport.call_count(), 0);

        f.transport.reply(Method::POST, "api/register", MockReply::status(201));
        assert!(f.manager.register("ana", "a@x.io", "pw", "pw").await);
        assert!(!f.manager.is_authenticated());
        assert_eq!(
            f.transport.calls()[0].body.clone().unwrap()["password_confirmation"],
            "pw"
        );

        f.transport.reply(Method::POST, "api/register", MockReply::json(409, json!({ "error": "taken" })));
        assert!(!f.manager.register("ana", "a@x.io", "pw", "pw").await);
        assert!(f.notifications.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_network_fails() {
        let f = fixture();
        f.transport.reply(Method::POST, "api/login", login_ok());
        f.transport.reply(Method::POST, "api/logout", MockReply::NetworkError("connection reset".into()));
        f.manager.login("ana", "pw").await.unwrap();

        f.manager.logout().await;

        assert!(!f.manager.is_authenticated());
        assert!(f.store.get(TOKEN_KEY).await.unwrap().is_none());
        assert_eq!(*f.notifications.lock().unwrap(), vec![Some(7), None]);
        assert_eq!(f.transport.calls()[1].token.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_logout_without_token_skips_network() {
        let f = fixture();
        f.manager.logout().await;
        assert_eq!(f.transport.call_count(), 0);
        assert_eq!(*f.notifications.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_refresh_without_token_skips_network() {
        let f = fixture();
        assert!(f.manager.refresh_current_user().await.is_none());
        assert_eq!(f.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_401_invalidates() {
        let f = fixture();
        f.store.set(TOKEN_KEY, "stale").await.unwrap();
        f.transport.reply(Method::GET, "api/user", MockReply::status(401));

        assert!(f.manager.refresh_current_user().await.is_none());
        assert!(f.store.get(TOKEN_KEY).await.unwrap().is_none());
        assert_eq!(*f.notifications.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_refresh_soft_failure_keeps_state() {
        let f = fixture();
        f.transport.reply(Method::POST, "api/login", login_ok());
        f.transport.reply(Method::GET, "api/user", MockReply::status(500));
        f.manager.login("ana", "pw").await.unwrap();

        assert!(f.manager.refresh_current_user().await.is_none());
        assert!(f.manager.is_authenticated());
        assert_eq!(f.store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok-1"));
        assert_eq!(*f.notifications.lock().unwrap(), vec![Some(7)]);
    }

    #[tokio::test]
    async fn test_stored_token_authenticates_refresh() {
        let f = fixture();
        f.transport.reply(Method::POST, "api/login", login_ok());
        f.transport.reply(
            Method::GET,
            "api/user",
            MockReply::json(200, json!({ "id": 7, "username": "ana2", "email": "ana@x.io" })),
        );
        f.manager.login("ana", "pw").await.unwrap();

        let user = f.manager.refresh_current_user().await.unwrap();
        assert_eq!(user.username, "ana2");
        assert_eq!(f.transport.calls()[1].token.as_deref(), Some("tok-1"));
        assert_eq!(f.manager.current_user().unwrap().username, "ana2");
        assert_eq!(*f.notifications.lock().unwrap(), vec![Some(7), Some(7)]);
    }

    #[tokio::test]
    async fn test_invalidate_ignores_stale_token() {
        let f = fixture();
        f.transport.reply(Method::POST, "api/login", login_ok());
        f.manager.login("ana", "pw").await.unwrap();

        f.manager.invalidate("some-older-token").await;
        assert!(f.manager.is_authenticated());

        f.manager.invalidate("tok-1").await;
        f.manager.invalidate("tok-1").await;
        assert!(!f.manager.is_authenticated());
        assert_eq!(*f.notifications.lock().unwrap(), vec![Some(7), None]);
    }

    #[tokio::test]
    async fn test_unavailable_store_is_absent_not_error() {
        let transport = MockTransport::new();
        transport.reply(Method::POST, "api/login", login_ok());
        let manager = SessionManager::new(plain_gateway(transport.clone()), Arc::new(UnavailableTokenStore));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        manager.on_session_changed(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert!(manager.login("ana", "pw").await.is_ok());
        assert!(manager.token().await.is_none());
        assert!(manager.refresh_current_user().await.is_none());
        assert_eq!(transport.call_count(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
