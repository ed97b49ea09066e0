//! Client library for the habit-tracker REST API.
//!
//! [`HttpClient`] is the only place requests leave the process; it attaches
//! the session's bearer token and rotates tokens on 401. The domain services
//! in [`services`] build on it, [`normalize`] turns the backend's list shapes
//! into one [`Page`], and [`AuthContext`] / [`NotificationCenter`] hold the
//! state a front end observes.

pub mod auth;
pub mod chart;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod normalize;
pub mod notifications;
pub mod retry;
pub mod services;
pub mod session;
pub mod stats;
pub mod token_store;
pub mod validation;

pub use auth::AuthContext;
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use error::{ApiError, Result};
pub use http::HttpClient;
pub use normalize::{Page, Pageable};
pub use notifications::{NewNotification, Notification, NotificationCenter, NotificationKind};
pub use retry::RetryPolicy;
pub use session::{AuthEvent, Session, SessionPhase};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
