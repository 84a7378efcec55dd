//! Account lifecycle and profile management.
//!
//! Sign-up writes the account and its `users/{uid}` profile (role Regular);
//! profile edits and account deletion act on the session's own user.

pub mod validation;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::directory::{Directory, DirectoryError, Document, USERS};
use crate::error::ErrorKind;
use crate::model::{DEFAULT_BIO, Role, Session, UserProfile};

pub use validation::{Field, FieldError, FieldErrors, ProfileUpdate, SignUpForm};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Invalid(FieldErrors),

    #[error("No user doc found for {0}")]
    ProfileMissing(String),

    #[error("Profile for {id} is malformed: {source}")]
    MalformedProfile {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::Invalid(_) => ErrorKind::Validation,
            AccountError::ProfileMissing(_) => ErrorKind::NotFound,
            AccountError::MalformedProfile { .. } => ErrorKind::Internal,
            AccountError::Directory(e) => e.kind(),
        }
    }
}

impl From<FieldErrors> for AccountError {
    fn from(errors: FieldErrors) -> Self {
        AccountError::Invalid(errors)
    }
}

fn single(field: Field, message: &'static str) -> AccountError {
    AccountError::Invalid(FieldErrors::single(field, message))
}

/// Load and parse `users/{user_id}`.
pub async fn fetch_profile<D: Directory + ?Sized>(
    directory: &D,
    user_id: &str,
) -> Result<UserProfile, AccountError> {
    let doc = directory
        .get_record(USERS, user_id)
        .await?
        .ok_or_else(|| AccountError::ProfileMissing(user_id.to_string()))?;

    UserProfile::from_document(user_id, doc).map_err(|source| AccountError::MalformedProfile {
        id: user_id.to_string(),
        source,
    })
}

/// Sign-up, sign-in and profile operations.
pub struct AccountService<D: Directory + ?Sized> {
    directory: Arc<D>,
}

impl<D: Directory + ?Sized> AccountService<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Validate the form, create the account and its Regular profile, and sign in.
    ///
    /// If the profile cannot be written the account is deleted again, so the
    /// address stays free for a retry.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<Session, AccountError> {
        form.validate()?;

        let email = form.email.trim();
        let uid = self.directory.create_account(email, &form.password).await?;
        let session = self.directory.sign_in(email, &form.password).await?;

        let profile = UserProfile {
            id: uid.clone(),
            display_name: form.full_name.trim().to_string(),
            email: email.to_string(),
            bio: DEFAULT_BIO.to_string(),
            avatar_url: String::new(),
            role: Role::Regular,
            phone: Some(form.phone.trim().to_string()),
            date_of_birth: Some(form.date_of_birth.trim().to_string()),
        };
        if let Err(e) = self
            .directory
            .set_record(&session, USERS, &uid, profile.to_document())
            .await
        {
            tracing::error!(uid = %uid, error = %e, "Profile write failed, removing new account");
            if let Err(cleanup) = self.directory.delete_account(&session).await {
                tracing::error!(uid = %uid, error = %cleanup, "Could not remove account after failed sign-up");
            }
            return Err(e.into());
        }

        tracing::info!(uid = %uid, "Signed up");
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(single(Field::Email, "Email and password are required"));
        }
        Ok(self.directory.sign_in(email, password).await?)
    }

    pub async fn sign_out(&self, session: &Session) -> Result<(), AccountError> {
        Ok(self.directory.sign_out(session).await?)
    }

    /// Request a password reset mail for `email`.
    pub async fn reset_password(&self, email: &str) -> Result<(), AccountError> {
        let email = email.trim();
        if !validation::is_valid_email(email) {
            return Err(single(Field::Email, "Invalid email format"));
        }
        Ok(self.directory.send_password_reset(email).await?)
    }

    pub async fn load_profile(&self, user_id: &str) -> Result<UserProfile, AccountError> {
        fetch_profile(self.directory.as_ref(), user_id).await
    }

    /// Apply `update` to the session's own profile and return the stored result.
    pub async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, AccountError> {
        update.validate()?;

        let mut fields = Document::new();
        fields.insert("fullName".into(), json!(update.display_name.trim()));
        fields.insert("bio".into(), json!(update.bio.trim()));
        if let Some(url) = &update.avatar_url {
            fields.insert("profilePicture".into(), Value::String(url.trim().to_string()));
        }
        fields.insert(
            "updatedAt".into(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        self.directory
            .set_record(session, USERS, &session.user_id, fields)
            .await?;
        tracing::debug!(uid = %session.user_id, "Profile updated");

        self.load_profile(&session.user_id).await
    }

    /// Remove `users/{uid}`, then the account itself.
    pub async fn delete_account(&self, session: &Session) -> Result<(), AccountError> {
        self.directory
            .delete_record(session, USERS, &session.user_id)
            .await?;
        self.directory.delete_account(session).await?;
        tracing::info!(uid = %session.user_id, "Account deleted");
        Ok(())
    }
}
