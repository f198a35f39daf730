//! The authenticated-user collaborator.
//!
//! Session handling lives outside this crate; the chat interface only needs
//! to know who the current user is, and receives that through an
//! [`AuthContext`] at construction.

use std::sync::{Arc, RwLock};

use huddle_shared::User;

#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    current: Arc<RwLock<Option<User>>>,
}

impl AuthContext {
    pub fn new(user: Option<User>) -> Self {
        Self {
            current: Arc::new(RwLock::new(user)),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Snapshot of the current user, `None` when signed out.
    pub fn current_user(&self) -> Option<User> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swap the signed-in user; every clone of this context observes it.
    pub fn set_user(&self, user: Option<User>) {
        match self.current.write() {
            Ok(mut guard) => *guard = user,
            Err(poisoned) => *poisoned.into_inner() = user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_session() {
        let auth = AuthContext::anonymous();
        let view = auth.clone();
        assert!(view.current_user().is_none());

        auth.set_user(Some(User::new(1, "a")));
        assert_eq!(view.current_user(), Some(User::new(1, "a")));
    }
}
