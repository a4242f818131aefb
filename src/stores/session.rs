//! Session context
//!
//! The logged-in user's identity and API token, passed explicitly to the
//! collaborators and coordinators that need it. Login and logout are the only
//! ways in and out; on the web build the session survives reloads through
//! LocalStorage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
const STORAGE_KEY_SESSION: &str = "feed_sync_session";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub token: String,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
            logged_in_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    current: Rc<RefCell<Option<Session>>>,
}

impl SessionContext {
    /// A context with nobody logged in
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, session: Session) {
        log::info!("Logged in as {}", session.user_id);
        #[cfg(target_arch = "wasm32")]
        {
            use gloo_storage::{LocalStorage, Storage};
            if let Err(e) = LocalStorage::set(STORAGE_KEY_SESSION, &session) {
                log::warn!("Failed to persist session: {}", e);
            }
        }
        *self.current.borrow_mut() = Some(session);
    }

    pub fn logout(&self) {
        if let Some(session) = self.current.borrow_mut().take() {
            log::info!("Logged out {}", session.user_id);
        }
        #[cfg(target_arch = "wasm32")]
        {
            use gloo_storage::{LocalStorage, Storage};
            LocalStorage::delete(STORAGE_KEY_SESSION);
        }
    }

    /// Restore a session saved by a previous `login`. Returns whether one was found.
    #[cfg(target_arch = "wasm32")]
    pub fn restore(&self) -> bool {
        use gloo_storage::{LocalStorage, Storage};
        match LocalStorage::get::<Session>(STORAGE_KEY_SESSION) {
            Ok(session) => {
                log::info!("Restored session for {}", session.user_id);
                *self.current.borrow_mut() = Some(session);
                true
            }
            Err(_) => false,
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.user_id.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_logout_lifecycle() {
        let ctx = SessionContext::new();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.token(), None);

        ctx.login(Session::new("u-42", "secret"));
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user_id().as_deref(), Some("u-42"));
        assert_eq!(ctx.token().as_deref(), Some("secret"));

        ctx.logout();
        assert!(!ctx.is_authenticated());
        assert!(ctx.current().is_none());
    }

    #[test]
    fn test_clones_share_session() {
        let screen = SessionContext::new();
        let collaborator = screen.clone();
        screen.login(Session::new("u-1", "t"));
        assert!(collaborator.is_authenticated());
    }
}
