//! Admin console: user listing and role changes.
//!
//! Entry requires a signed-in Admin. Role changes are checked here with
//! the same rule the directory applies, so a refused change shows its
//! reason without a round trip; the directory still has the final say.

use std::sync::Arc;

use serde_json::json;

use crate::accounts::{AccountError, fetch_profile};
use crate::auth::{Alert, Redirect, Route};
use crate::directory::rules::{self, Actor, Denial};
use crate::directory::{Directory, DirectoryError, Document, USERS};
use crate::error::ErrorKind;
use crate::model::{Role, Session, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("{0}")]
    Denied(#[from] Denial),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl AdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::Denied(_) => ErrorKind::Authorization,
            AdminError::UserNotFound(_) => ErrorKind::NotFound,
            AdminError::Account(e) => e.kind(),
            AdminError::Directory(e) => e.kind(),
        }
    }
}

/// True when `profile` matches `term` by name or email, ignoring case.
pub fn matches_term(profile: &UserProfile, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty()
        || profile.display_name.to_lowercase().contains(&term)
        || profile.email.to_lowercase().contains(&term)
}

/// An Admin's view of the user directory.
pub struct AdminConsole<D: Directory + ?Sized> {
    directory: Arc<D>,
    session: Session,
    actor: Actor,
}

impl<D: Directory + ?Sized> std::fmt::Debug for AdminConsole<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConsole")
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

impl<D: Directory + ?Sized> AdminConsole<D> {
    /// Open the console for `session`, or say where to go instead.
    pub async fn enter(directory: Arc<D>, session: Option<&Session>) -> Result<Self, Redirect> {
        let Some(session) = session else {
            return Err(Redirect::new(Route::SignIn, Alert::not_logged_in()));
        };

        let profile = match fetch_profile(directory.as_ref(), &session.user_id).await {
            Ok(profile) => profile,
            Err(AccountError::ProfileMissing(_)) => {
                return Err(Redirect::new(Route::MainMenu, Alert::missing_profile()));
            }
            Err(e) => {
                tracing::warn!(uid = %session.user_id, error = %e, "Could not load admin profile");
                return Err(Redirect::new(
                    Route::MainMenu,
                    Alert::new("Error", e.to_string()),
                ));
            }
        };

        if profile.role != Role::Admin {
            tracing::info!(uid = %session.user_id, role = %profile.role, "Admin console refused");
            return Err(Redirect::new(Route::MainMenu, Alert::access_denied()));
        }

        Ok(Self {
            directory,
            session: session.clone(),
            actor: Actor {
                user_id: session.user_id.clone(),
                role: profile.role,
            },
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Every user whose name or email contains `term`; all users for a blank term.
    pub async fn list_users(&self, term: &str) -> Result<Vec<UserProfile>, AdminError> {
        let rows = self.directory.list_records(USERS).await?;

        let users = rows
            .into_iter()
            .filter_map(|(id, doc)| match UserProfile::from_document(&id, doc) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(uid = %id, error = %e, "Skipping malformed profile");
                    None
                }
            })
            .filter(|profile| matches_term(profile, term))
            .collect();
        Ok(users)
    }

    /// Move `user_id` to `role` and return the stored profile.
    pub async fn change_role(&self, user_id: &str, role: Role) -> Result<UserProfile, AdminError> {
        let target = match fetch_profile(self.directory.as_ref(), user_id).await {
            Ok(profile) => profile,
            Err(AccountError::ProfileMissing(_)) => {
                return Err(AdminError::UserNotFound(user_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if target.role == role {
            return Ok(target);
        }
        rules::check_role_change(&self.actor, user_id, target.role, role)?;

        let mut fields = Document::new();
        fields.insert("role".into(), json!(role.as_str()));
        self.directory
            .set_record(&self.session, USERS, user_id, fields)
            .await?;

        tracing::info!(uid = %user_id, from = %target.role, to = %role, "Role changed");
        Ok(fetch_profile(self.directory.as_ref(), user_id).await?)
    }
}
