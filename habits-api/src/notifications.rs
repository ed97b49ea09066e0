//! Transient user-facing messages with per-notification expiry timers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::AbortHandle;
use uuid::Uuid;

pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);
pub const ERROR_DURATION: Duration = Duration::from_millis(7000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn default_duration(&self) -> Duration {
        match self {
            NotificationKind::Error => ERROR_DURATION,
            _ => DEFAULT_DURATION,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Success => "✔",
            NotificationKind::Error => "✖",
            NotificationKind::Warning => "⚠",
            NotificationKind::Info => "ℹ",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        };
        f.write_str(label)
    }
}

/// Follow-up the user can take, e.g. `habits login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub label: String,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    /// Zero means the notification stays until removed.
    pub duration: Duration,
    pub action: Option<NotificationAction>,
}

impl Notification {
    pub fn is_persistent(&self) -> bool {
        self.duration.is_zero()
    }
}

/// What a caller supplies; the center fills in the id and default duration.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    pub duration: Option<Duration>,
    pub action: Option<NotificationAction>,
}

impl NewNotification {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: None,
            duration: None,
            action: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn persistent(self) -> Self {
        self.duration(Duration::ZERO)
    }

    pub fn action(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.action = Some(NotificationAction {
            label: label.into(),
            command: command.into(),
        });
        self
    }
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<Notification>,
    timers: HashMap<String, AbortHandle>,
}

/// Owns the visible notifications. Cloning shares the same set.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    state: Arc<Mutex<State>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        lock_state(&self.state)
    }

    /// Add a notification and return its id.
    ///
    /// Non-persistent notifications are removed after their duration by a
    /// spawned timer task. Outside a tokio runtime no timer is scheduled.
    pub fn add(&self, new: NewNotification) -> String {
        let id = Uuid::now_v7().to_string();
        let duration = new.duration.unwrap_or_else(|| new.kind.default_duration());
        let notification = Notification {
            id: id.clone(),
            kind: new.kind,
            title: new.title,
            message: new.message,
            duration,
            action: new.action,
        };

        tracing::debug!(%id, kind = %notification.kind, title = %notification.title, "notification added");

        let mut state = self.lock();
        state.entries.push(notification);
        if !duration.is_zero() {
            if let Some(timer) = spawn_expiry(Arc::downgrade(&self.state), id.clone(), duration) {
                state.timers.insert(id.clone(), timer);
            }
        }
        id
    }

    pub fn success(&self, title: impl Into<String>, message: Option<String>) -> String {
        self.add_kind(NotificationKind::Success, title, message)
    }

    pub fn error(&self, title: impl Into<String>, message: Option<String>) -> String {
        self.add_kind(NotificationKind::Error, title, message)
    }

    pub fn warning(&self, title: impl Into<String>, message: Option<String>) -> String {
        self.add_kind(NotificationKind::Warning, title, message)
    }

    pub fn info(&self, title: impl Into<String>, message: Option<String>) -> String {
        self.add_kind(NotificationKind::Info, title, message)
    }

    fn add_kind(&self, kind: NotificationKind, title: impl Into<String>, message: Option<String>) -> String {
        let mut new = NewNotification::new(kind, title);
        new.message = message;
        self.add(new)
    }

    /// Remove by id and cancel its pending timer. Unknown ids are ignored.
    pub fn remove(&self, id: &str) -> Option<Notification> {
        let mut state = self.lock();
        if let Some(timer) = state.timers.remove(id) {
            timer.abort();
        }
        let index = state.entries.iter().position(|n| n.id == id)?;
        Some(state.entries.remove(index))
    }

    pub fn remove_all(&self) {
        let mut state = self.lock();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
        state.entries.clear();
    }

    /// Snapshot in display (insertion) order.
    pub fn list(&self) -> Vec<Notification> {
        self.lock().entries.clone()
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.lock().entries.iter().find(|n| n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Number of expiry timers still pending.
    pub fn pending_timers(&self) -> usize {
        self.lock().timers.len()
    }
}

fn lock_state(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn spawn_expiry(state: Weak<Mutex<State>>, id: String, after: Duration) -> Option<AbortHandle> {
    let handle = tokio::runtime::Handle::try_current().ok()?;
    let task = handle.spawn(async move {
        tokio::time::sleep(after).await;
        let Some(state) = state.upgrade() else {
            return;
        };
        let mut state = lock_state(&state);
        state.timers.remove(&id);
        state.entries.retain(|n| n.id != id);
        tracing::trace!(%id, "notification expired");
    });
    Some(task.abort_handle())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn run_timers(for_ms: u64) {
        tokio::time::sleep(Duration::from_millis(for_ms)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn errors_expire_after_seven_seconds_info_after_five() {
        let center = NotificationCenter::new();
        let error = center.add(NewNotification::new(NotificationKind::Error, "X"));
        let info = center.add(NewNotification::new(NotificationKind::Info, "Y"));

        assert_eq!(center.get(&error).unwrap().duration, ERROR_DURATION);
        assert_eq!(center.get(&info).unwrap().duration, DEFAULT_DURATION);

        run_timers(4_999).await;
        assert_eq!(center.len(), 2);

        run_timers(2).await;
        assert!(center.get(&info).is_none());
        assert!(center.get(&error).is_some());

        run_timers(2_000).await;
        assert!(center.is_empty());
        assert_eq!(center.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_is_persistent() {
        let center = NotificationCenter::new();
        let id = center.add(NewNotification::new(NotificationKind::Warning, "Stay").persistent());

        run_timers(60_000).await;
        assert!(center.get(&id).unwrap().is_persistent());
        assert_eq!(center.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_remove_cancels_the_timer() {
        let center = NotificationCenter::new();
        let id = center.success("Saved", None);
        assert_eq!(center.pending_timers(), 1);

        assert!(center.remove(&id).is_some());
        assert_eq!(center.pending_timers(), 0);
        assert!(center.remove(&id).is_none());

        run_timers(10_000).await;
        assert!(center.is_empty());
    }

    #[tokio::test]
    async fn ids_are_unique_and_order_is_kept() {
        let center = NotificationCenter::new();
        let ids: Vec<String> = (0..50)
            .map(|i| center.info(format!("n{i}"), None))
            .collect();

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());

        let titles: Vec<String> = center.list().into_iter().map(|n| n.title).collect();
        assert_eq!(titles[0], "n0");
        assert_eq!(titles[49], "n49");

        center.remove_all();
        assert!(center.is_empty());
        assert_eq!(center.pending_timers(), 0);
    }

    #[test]
    fn no_runtime_means_no_timer() {
        let center = NotificationCenter::new();
        let id = center.error("Offline", Some("Check your connection".into()));
        assert_eq!(center.pending_timers(), 0);
        assert_eq!(center.get(&id).unwrap().message.as_deref(), Some("Check your connection"));
    }
}
