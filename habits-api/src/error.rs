use reqwest::StatusCode;
use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the server. Check your internet connection.";

/// Every failure a caller of this crate can observe.
///
/// The type is `Clone` so a single refresh outcome can be handed to every
/// request that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout).
    #[error("{message}")]
    Network { message: String },
    /// The server answered with a 4xx/5xx status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
    },
    /// A response arrived but matched none of the known shapes.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// Local field checks failed before any request was sent.
    #[error("Invalid data: {}", .0.join(", "))]
    Validation(Vec<String>),
    /// The access token was rejected and no refresh could be attempted.
    #[error("Session expired, please log in again")]
    AuthExpired,
    /// The refresh exchange failed; the session has been cleared.
    #[error("Session refresh failed: {0}")]
    RefreshFailed(String),
    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
        }
    }

    /// Build an HTTP error from a status and an optional JSON error body.
    pub fn from_status(status: StatusCode, body: Option<&serde_json::Value>) -> Self {
        let message = body
            .and_then(|b| b.get("message"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_status_message(status).to_string());
        let code = body
            .and_then(|b| b.get("code"))
            .and_then(|c| c.as_str())
            .map(str::to_string);

        Self::Http {
            status: status.as_u16(),
            message,
            code,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status, `Some(0)` for network failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network { .. } => Some(0),
            Self::AuthExpired | Self::RefreshFailed(_) => Some(401),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Http { code, .. } => code.as_deref(),
            Self::Network { .. } => Some("NETWORK_ERROR"),
            Self::MalformedResponse(_) => Some("MALFORMED_RESPONSE"),
            Self::Validation(_) => Some("VALIDATION_ERROR"),
            Self::AuthExpired => Some("AUTH_EXPIRED"),
            Self::RefreshFailed(_) => Some("REFRESH_FAILED"),
            Self::Unexpected(_) => Some("UNKNOWN_ERROR"),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return ApiError::MalformedResponse(format!("Failed to parse response as JSON: {e}"));
        }
        if e.is_builder() {
            return ApiError::Unexpected(e.to_string());
        }
        if let Some(status) = e.status() {
            return ApiError::from_status(status, None);
        }
        tracing::debug!(error = %e, "request failed without a response");
        ApiError::network(NETWORK_ERROR_MESSAGE)
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        ApiError::Unexpected(format!("Invalid URL: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

fn default_status_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Invalid data sent to the server",
        401 => "You must log in to access this resource",
        403 => "You do not have permission to access this resource",
        404 => "Resource not found",
        409 => "Conflict with the current state of the resource",
        422 => "Invalid data",
        429 => "Too many requests, please wait before retrying",
        500 => "Internal server error",
        502 => "Bad gateway",
        503 => "Service temporarily unavailable",
        504 => "Gateway timeout",
        _ => "An error occurred",
    }
}
