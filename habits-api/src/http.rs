//! The single chokepoint for outbound calls.
//!
//! Every request carries the session's bearer token. A 401 on a first attempt
//! triggers one token refresh, shared by every request that hits a 401 while
//! it is in flight, after which each of those requests is replayed once.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::models::{AuthResponse, RefreshTokenRequest, TokenPair};
use crate::session::{AuthEvent, Session};
use crate::token_store::TokenStore;

type RefreshFuture = Shared<BoxFuture<'static, Result<TokenPair>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    /// Bearer token, refresh and replay once on 401.
    Bearer,
    /// Bearer token if present, a 401 is returned as is.
    BearerNoRefresh,
    Anonymous,
}

struct RequestParts {
    method: Method,
    path: String,
    query: Option<Value>,
    body: Option<Value>,
    auth: AuthMode,
}

impl RequestParts {
    fn new(method: Method, path: &str, auth: AuthMode) -> Self {
        Self {
            method,
            path: path.trim_start_matches('/').to_string(),
            query: None,
            body: None,
            auth,
        }
    }

    fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        self.query = Some(encode(query)?);
        Ok(self)
    }

    fn body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(encode(body)?);
        Ok(self)
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::unexpected(format!("Failed to encode request: {e}")))
}

struct Inner {
    http: Client,
    base_url: Url,
    session: Arc<Session>,
    store: Arc<dyn TokenStore>,
    pending_refresh: Mutex<Option<RefreshFuture>>,
}

#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(
        config: ClientConfig,
        session: Arc<Session>,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::unexpected(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url,
                session,
                store,
                pending_refresh: Mutex::new(None),
            }),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute_json(RequestParts::new(Method::GET, path, AuthMode::Bearer))
            .await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.execute_json(RequestParts::new(Method::GET, path, AuthMode::Bearer).query(query)?)
            .await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute_json(RequestParts::new(Method::POST, path, AuthMode::Bearer).body(body)?)
            .await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute_json(RequestParts::new(Method::PUT, path, AuthMode::Bearer).body(body)?)
            .await
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute_json(RequestParts::new(Method::PATCH, path, AuthMode::Bearer))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .execute(RequestParts::new(Method::DELETE, path, AuthMode::Bearer))
            .await?;
        drain_body(response, path).await;
        Ok(())
    }

    /// POST without a bearer token and without refresh handling
    /// (login, register).
    pub async fn post_anonymous<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute_json(RequestParts::new(Method::POST, path, AuthMode::Anonymous).body(body)?)
            .await
    }

    /// POST with the current token and no refresh handling (logout).
    pub async fn post_no_refresh<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let response = self
            .execute(RequestParts::new(Method::POST, path, AuthMode::BearerNoRefresh).body(body)?)
            .await?;
        drain_body(response, path).await;
        Ok(())
    }

    async fn execute_json<T: DeserializeOwned>(&self, parts: RequestParts) -> Result<T> {
        let call = format!("{} /{}", parts.method, parts.path);
        let response = self.execute(parts).await?;
        parse_json(response, &call).await
    }

    async fn execute(&self, parts: RequestParts) -> Result<Response> {
        let token = match parts.auth {
            AuthMode::Anonymous => None,
            AuthMode::Bearer | AuthMode::BearerNoRefresh => self.inner.session.access_token(),
        };

        let response = self.dispatch(&parts, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || parts.auth != AuthMode::Bearer {
            return check_status(response).await;
        }

        tracing::debug!(path = %parts.path, "received 401, refreshing access token");
        let fresh_token = self.token_after_unauthorized(token.as_deref()).await?;

        // Second attempt: a 401 here is final.
        let response = self.dispatch(&parts, Some(&fresh_token)).await?;
        check_status(response).await
    }

    async fn dispatch(&self, parts: &RequestParts, token: Option<&str>) -> Result<Response> {
        let url = self.inner.base_url.join(&parts.path)?;
        let mut request = self.inner.http.request(parts.method.clone(), url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(query) = &parts.query {
            request = request.query(query);
        }
        if let Some(body) = &parts.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %parts.method, path = %parts.path, error = %e, "request failed");
            ApiError::from(e)
        })?;
        tracing::debug!(
            method = %parts.method,
            path = %parts.path,
            status = response.status().as_u16(),
            "response received"
        );
        Ok(response)
    }

    /// Token to replay with after a 401 obtained using `used_token`.
    async fn token_after_unauthorized(&self, used_token: Option<&str>) -> Result<String> {
        let refresh = {
            let mut slot = self.refresh_slot()?;
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    // Someone else already settled a refresh since this request was sent.
                    match (self.inner.session.access_token(), used_token) {
                        (Some(current), used) if Some(current.as_str()) != used => {
                            return Ok(current);
                        }
                        (None, Some(_)) => return Err(ApiError::AuthExpired),
                        _ => {}
                    }
                    self.start_refresh(&mut slot)
                }
            }
        };
        Ok(self.await_refresh(refresh).await?.access_token)
    }

    /// Exchange the persisted refresh token for a new pair.
    ///
    /// Concurrent callers share one exchange and all observe its outcome.
    pub async fn refresh_tokens(&self) -> Result<TokenPair> {
        let refresh = {
            let mut slot = self.refresh_slot()?;
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => self.start_refresh(&mut slot),
            }
        };
        self.await_refresh(refresh).await
    }

    fn refresh_slot(&self) -> Result<MutexGuard<'_, Option<RefreshFuture>>> {
        self.inner
            .pending_refresh
            .lock()
            .map_err(|_| ApiError::unexpected("refresh lock poisoned"))
    }

    fn start_refresh(&self, slot: &mut Option<RefreshFuture>) -> RefreshFuture {
        let pending = run_refresh(self.inner.clone()).boxed().shared();
        *slot = Some(pending.clone());
        pending
    }

    async fn await_refresh(&self, refresh: RefreshFuture) -> Result<TokenPair> {
        let outcome = refresh.clone().await;

        // The session already holds the outcome, so later 401s see the new
        // token (or the cleared session) instead of this future.
        if let Ok(mut slot) = self.inner.pending_refresh.lock() {
            if slot.as_ref().is_some_and(|pending| pending.ptr_eq(&refresh)) {
                *slot = None;
            }
        }

        outcome
    }
}

async fn run_refresh(inner: Arc<Inner>) -> Result<TokenPair> {
    let outcome = exchange_refresh_token(&inner).await;

    match outcome {
        Ok(auth) => {
            let tokens = auth.tokens();
            if let Err(e) = inner.store.save(&tokens) {
                tracing::warn!(error = %e, "could not persist rotated tokens");
            }
            inner.session.set_tokens(tokens.clone());
            if let Some(user) = auth.user {
                inner.session.set_user(user);
            }
            inner.session.emit(AuthEvent::TokensRotated);
            tracing::info!("access token refreshed");
            Ok(tokens)
        }
        Err(e) => {
            tracing::warn!(error = %e, "token refresh failed, clearing session");
            if let Err(clear_err) = inner.store.clear() {
                tracing::warn!(error = %clear_err, "could not clear persisted tokens");
            }
            inner.session.clear();
            inner.session.emit(AuthEvent::LoginRequired {
                reason: e.message(),
            });
            Err(match e {
                ApiError::AuthExpired => ApiError::AuthExpired,
                other => ApiError::RefreshFailed(other.message()),
            })
        }
    }
}

async fn exchange_refresh_token(inner: &Inner) -> Result<AuthResponse> {
    let refresh_token = inner.store.refresh_token()?.ok_or(ApiError::AuthExpired)?;

    let url = inner.base_url.join("auth/refresh")?;
    let response = inner
        .http
        .post(url)
        .json(&RefreshTokenRequest {
            refresh_token: &refresh_token,
        })
        .send()
        .await?;
    let response = check_status(response).await?;
    parse_json(response, "POST /auth/refresh").await
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.ok();
    let body: Option<Value> = body.and_then(|b| serde_json::from_slice(&b).ok());
    Err(ApiError::from_status(status, body.as_ref()))
}

/// Read and drop a body nobody decodes. The status already decided the
/// outcome, so a read error is only logged.
async fn drain_body(response: Response, path: &str) {
    if let Err(e) = response.bytes().await {
        tracing::debug!(path, error = %e, "failed to read response body");
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response, call: &str) -> Result<T> {
    let bytes = response.bytes().await?;
    // Empty bodies (204) decode as null so `()` and `Option<_>` work.
    let value: Value = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::malformed(format!("Failed to parse {} response: {}", call, e))
        })?
    };

    serde_json::from_value(value)
        .map_err(|e| ApiError::malformed(format!("Unexpected {} response: {}", call, e)))
}
