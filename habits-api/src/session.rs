use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use crate::models::{TokenPair, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Session changes that observers (the front end) may react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn,
    TokensRotated,
    LoggedOut,
    /// The session could not be recovered; the user has to log in again.
    LoginRequired { reason: String },
}

#[derive(Debug, Default)]
struct SessionState {
    phase: SessionPhase,
    user: Option<User>,
    tokens: Option<TokenPair>,
}

/// The single in-memory session shared by the HTTP client and the auth
/// context. Everything here is synchronous; nothing is held across awaits.
#[derive(Debug)]
pub struct Session {
    state: RwLock<SessionState>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: RwLock::new(SessionState::default()),
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> SessionPhase {
        self.read().phase
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.read().tokens.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().tokens.as_ref().map(|t| t.access_token.clone())
    }

    /// True iff both a user and an access token are held in memory.
    pub fn is_authenticated(&self) -> bool {
        let state = self.read();
        state.user.is_some() && state.tokens.is_some()
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.read().phase,
            SessionPhase::Uninitialized | SessionPhase::Loading
        )
    }

    pub(crate) fn begin_loading(&self) {
        self.write().phase = SessionPhase::Loading;
    }

    /// Leave the loading phase without changing who is logged in.
    pub(crate) fn settle(&self) {
        let mut state = self.write();
        state.phase = if state.user.is_some() && state.tokens.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Unauthenticated
        };
    }

    pub(crate) fn establish(&self, user: User, tokens: TokenPair) {
        let mut state = self.write();
        state.user = Some(user);
        state.tokens = Some(tokens);
        state.phase = SessionPhase::Authenticated;
    }

    pub(crate) fn set_user(&self, user: User) {
        self.write().user = Some(user);
    }

    pub(crate) fn set_tokens(&self, tokens: TokenPair) {
        self.write().tokens = Some(tokens);
    }

    pub(crate) fn clear(&self) {
        let mut state = self.write();
        state.user = None;
        state.tokens = None;
        state.phase = SessionPhase::Unauthenticated;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            first_name: None,
            last_name: None,
            role: Role::User,
            created_at: None,
        }
    }

    fn tokens() -> TokenPair {
        TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
        }
    }

    #[test]
    fn authenticated_requires_user_and_token() {
        let session = Session::new();
        assert!(session.is_loading());
        assert!(!session.is_authenticated());

        session.set_tokens(tokens());
        assert!(!session.is_authenticated());

        session.set_user(alice());
        assert!(session.is_authenticated());

        session.clear();
        assert!(!session.is_authenticated());
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
        assert!(!session.is_loading());
    }

    #[test]
    fn settle_derives_phase_from_contents() {
        let session = Session::new();
        session.begin_loading();
        session.settle();
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);

        session.establish(alice(), tokens());
        session.begin_loading();
        session.settle();
        assert_eq!(session.phase(), SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let session = Session::new();
        let mut rx = session.subscribe();
        session.emit(AuthEvent::TokensRotated);
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::TokensRotated);
    }
}
