//! Identity provider boundary
//!
//! Authentication itself happens elsewhere; the session only needs to know
//! who is signed in and how to sign them out.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub email: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;

    /// Terminate the user's sign-in
    async fn sign_out(&self);
}

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
    fn current_user(&self) -> Option<User> {
        (**self).current_user()
    }

    async fn sign_out(&self) {
        (**self).sign_out().await;
    }
}

/// Identity configured at startup, held for the lifetime of the process
pub struct LocalIdentity {
    user: watch::Sender<Option<User>>,
}

impl LocalIdentity {
    pub fn new(email: Option<String>) -> Self {
        let user = email
            .filter(|e| !e.trim().is_empty())
            .map(|email| User { email });
        Self {
            user: watch::Sender::new(user),
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    async fn sign_out(&self) {
        if let Some(user) = self.user.send_replace(None) {
            tracing::info!(email = %user.email, "User signed out");
        }
    }
}
