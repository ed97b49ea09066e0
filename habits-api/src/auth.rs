//! Session lifecycle: startup validation, login/register, logout and explicit
//! refresh, over the shared [`Session`] and [`TokenStore`].

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::services::AuthService;
use crate::session::{AuthEvent, Session, SessionPhase};
use crate::token_store::TokenStore;

/// Owns the authentication state machine
/// `Uninitialized -> Loading -> {Authenticated, Unauthenticated}`.
///
/// Built once with its collaborators and handed by reference to whatever
/// needs it; [`AuthContext::teardown`] ends its background work.
pub struct AuthContext {
    client: HttpClient,
    auth: AuthService,
    session: Arc<Session>,
    store: Arc<dyn TokenStore>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("phase", &self.session.phase())
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    pub fn new(client: HttpClient) -> Self {
        let session = client.session().clone();
        let store = client.token_store().clone();
        Self {
            auth: AuthService::new(client.clone()),
            client,
            session,
            store,
            watcher: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.access_token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.session.subscribe()
    }

    /// Restore a persisted session.
    ///
    /// With no stored access token this settles as unauthenticated without
    /// touching the network. Otherwise the token is checked against
    /// GET /auth/me; any failure discards the stored tokens.
    pub async fn init(&self) {
        self.session.begin_loading();
        self.watch_events();

        let stored = match self.store.load() {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored tokens");
                None
            }
        };

        let Some(tokens) = stored else {
            tracing::debug!("no stored session");
            self.session.settle();
            return;
        };

        self.session.set_tokens(tokens);
        match self.auth.me().await {
            Ok(user) => {
                tracing::info!(username = %user.username, "restored session");
                self.session.set_user(user);
            }
            Err(e) => {
                tracing::info!(error = %e, "stored session is no longer valid");
                self.discard_local_session();
            }
        }
        self.session.settle();
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.session.begin_loading();
        let outcome = self.auth.login(&request).await;
        self.complete_credential_exchange(outcome).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.session.begin_loading();
        let outcome = self.auth.register(request).await;
        self.complete_credential_exchange(outcome).await
    }

    async fn complete_credential_exchange(&self, outcome: Result<AuthResponse>) -> Result<User> {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                self.session.settle();
                return Err(e);
            }
        };

        let tokens = response.tokens();
        if let Err(e) = self.store.save(&tokens) {
            self.session.settle();
            return Err(e);
        }
        self.session.set_tokens(tokens.clone());

        let user = match response.user {
            Some(user) => user,
            None => match self.auth.me().await {
                Ok(user) => user,
                Err(e) => {
                    self.discard_local_session();
                    return Err(e);
                }
            },
        };

        self.session.establish(user.clone(), tokens);
        self.session.emit(AuthEvent::LoggedIn);
        tracing::info!(username = %user.username, "logged in");
        Ok(user)
    }

    /// Forget the session locally. Never touches the network.
    pub fn logout(&self) {
        self.discard_local_session();
        self.session.emit(AuthEvent::LoggedOut);
        tracing::info!("logged out");
    }

    /// Ask the server to revoke the refresh token, then [`logout`](Self::logout)
    /// whatever the server said.
    pub async fn logout_with_server(&self) {
        if let Some(tokens) = self.session.tokens() {
            if let Err(e) = self.auth.logout(&tokens.refresh_token).await {
                tracing::debug!(error = %e, "server-side logout failed");
            }
        }
        self.logout();
    }

    /// Exchange the stored refresh token for a new pair. A failure ends the
    /// session.
    pub async fn refresh_token(&self) -> Result<()> {
        match self.client.refresh_tokens().await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.logout();
                Err(e)
            }
        }
    }

    /// Stop background work started by [`init`](Self::init).
    pub fn teardown(&self) {
        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(task) = watcher.take() {
                task.abort();
            }
        }
    }

    fn discard_local_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "could not clear stored tokens");
        }
        self.session.clear();
    }

    fn watch_events(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let Ok(mut watcher) = self.watcher.lock() else {
            return;
        };
        if watcher.is_some() {
            return;
        }

        let mut events = self.session.subscribe();
        *watcher = Some(runtime.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::LoginRequired { reason }) => {
                        tracing::warn!(%reason, "session ended, login required");
                    }
                    Ok(event) => tracing::debug!(?event, "auth event"),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "auth event watcher lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.teardown();
    }
}
