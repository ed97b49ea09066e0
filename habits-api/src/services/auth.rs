use serde_json::json;
use tracing::instrument;

use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, TokenPair, User};
use crate::validation;

#[derive(Debug, Clone)]
pub struct AuthService {
    client: HttpClient,
}

impl AuthService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    #[instrument(name = "AuthService::login", skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        validation::validate_login(request)?;
        self.client.post_anonymous("auth/login", request).await
    }

    #[instrument(name = "AuthService::register", skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        validation::validate_register(request)?;
        self.client.post_anonymous("auth/register", request).await
    }

    /// Rotate the token pair. Shares an exchange already in flight.
    pub async fn refresh(&self) -> Result<TokenPair> {
        self.client.refresh_tokens().await
    }

    pub async fn me(&self) -> Result<User> {
        self.client.get("auth/me").await
    }

    #[instrument(name = "AuthService::logout", skip_all)]
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        self.client
            .post_no_refresh("auth/logout", &json!({ "refreshToken": refresh_token }))
            .await
    }
}
