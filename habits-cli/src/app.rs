use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use habits_api::models::User;
use habits_api::services::{AchievementService, HabitService, ProgressService, StatisticsService};
use habits_api::{
    ApiError, AuthContext, AuthEvent, FileTokenStore, HttpClient, NewNotification,
    NotificationCenter, NotificationKind, RetryPolicy, Session, TokenStore,
};
use time::{Date, OffsetDateTime};
use tokio::sync::broadcast;

use crate::config::HabitsConfig;
use crate::ui::widgets::print_notification;

/// Everything a page needs, built once per invocation.
pub struct App {
    pub config: HabitsConfig,
    pub auth: AuthContext,
    pub habits: HabitService,
    pub progress: ProgressService,
    pub achievements: AchievementService,
    pub statistics: StatisticsService,
    pub notifications: NotificationCenter,
    pub retry: RetryPolicy,
    events: broadcast::Receiver<AuthEvent>,
}

impl App {
    /// Wire the client against the on-disk token file.
    pub fn connect(config: HabitsConfig) -> Result<Self> {
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::default_location()?);
        let client = HttpClient::new(config.client_config()?, Arc::new(Session::new()), store)?;
        Ok(Self::new(config, client))
    }

    pub fn new(config: HabitsConfig, client: HttpClient) -> Self {
        let auth = AuthContext::new(client.clone());
        let events = auth.subscribe();
        Self {
            retry: RetryPolicy::new(config.load_retries, Duration::from_millis(500)),
            config,
            habits: HabitService::new(client.clone()),
            progress: ProgressService::new(client.clone()),
            achievements: AchievementService::new(client.clone()),
            statistics: StatisticsService::new(client),
            auth,
            notifications: NotificationCenter::new(),
            events,
        }
    }

    /// Restore the stored session, if any.
    pub async fn start(&self) {
        self.auth.init().await;
    }

    pub fn require_user(&self) -> Result<User> {
        self.auth
            .user()
            .ok_or_else(|| anyhow::Error::new(ApiError::AuthExpired))
            .context("Not signed in")
    }

    pub fn today(&self) -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }

    /// Turn an API failure into an error notification.
    pub fn report(&self, title: &str, error: &ApiError) {
        let message = match error {
            ApiError::Validation(messages) => messages.join("; "),
            other => other.message(),
        };
        self.notifications.error(title, Some(message));
    }

    /// Fold pending auth events into notifications. Returns true when the
    /// session ended and the user has to sign in again.
    pub fn drain_auth_events(&mut self) -> bool {
        let mut login_required = false;
        loop {
            match self.events.try_recv() {
                Ok(AuthEvent::LoginRequired { reason }) => {
                    login_required = true;
                    self.notifications.add(
                        NewNotification::new(NotificationKind::Error, "Session expired")
                            .message(reason)
                            .action("Sign in again", "habits login")
                            .persistent(),
                    );
                }
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        login_required
    }

    /// Print and clear every pending notification.
    pub fn flush_notifications(&self) {
        for notification in self.notifications.list() {
            print_notification(&notification);
        }
        self.notifications.remove_all();
    }

    pub fn shutdown(&self) {
        self.notifications.remove_all();
        self.auth.teardown();
    }
}

/// True for errors that mean the stored session is gone.
pub fn is_session_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ApiError>(),
            Some(ApiError::AuthExpired | ApiError::RefreshFailed(_))
        )
    })
}
