//! Explicit authentication context and navigation outcomes.
//!
//! [`AuthContext`] follows the directory's auth-state stream and hands out
//! the current [`Session`]; screens that refuse entry answer with a
//! [`Redirect`] carrying the alert to show.

use std::fmt;

use tokio::sync::watch;

use crate::directory::{AuthState, Directory};
use crate::model::Session;

/// Places a redirect can send the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SignIn,
    MainMenu,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::SignIn => "/signin",
            Route::MainMenu => "/menu",
        }
    }
}

/// Title and message of a user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: &'static str,
    pub message: String,
}

impl Alert {
    pub fn new(title: &'static str, message: impl Into<String>) -> Self {
        Self {
            title,
            message: message.into(),
        }
    }

    pub fn not_logged_in() -> Self {
        Self::new("Not Logged In", "Please sign in first.")
    }

    pub fn access_denied() -> Self {
        Self::new("Access Denied", "You are not an Admin.")
    }

    pub fn missing_profile() -> Self {
        Self::new("Error", "No user doc found for current user.")
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// A refused navigation: where to go instead and what to tell the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
    pub alert: Alert,
}

impl Redirect {
    pub fn new(to: Route, alert: Alert) -> Self {
        Self { to, alert }
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (redirecting to {})", self.alert, self.to.path())
    }
}

/// Current authentication state, passed explicitly to whoever needs it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    state: watch::Receiver<AuthState>,
}

impl AuthContext {
    pub fn new(state: watch::Receiver<AuthState>) -> Self {
        Self { state }
    }

    pub fn for_directory<D: Directory + ?Sized>(directory: &D) -> Self {
        Self::new(directory.subscribe_auth())
    }

    /// Session of the signed-in user, if any.
    pub fn current(&self) -> Option<Session> {
        match &*self.state.borrow() {
            AuthState::SignedIn(session) => Some(session.clone()),
            AuthState::SignedOut => None,
        }
    }

    /// Current session, or the redirect to the sign-in screen.
    pub fn require(&self) -> Result<Session, Redirect> {
        self.current()
            .ok_or_else(|| Redirect::new(Route::SignIn, Alert::not_logged_in()))
    }

    /// Wait for the next sign-in or sign-out and return the new session.
    pub async fn changed(&mut self) -> Option<Session> {
        if self.state.changed().await.is_err() {
            tracing::debug!("Auth state stream closed");
        }
        self.current()
    }
}
