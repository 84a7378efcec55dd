//! SQLite-backed [`Directory`].
//!
//! Documents are stored as JSON text in a single `records` table keyed by
//! `(collection, id)`. Accounts and sessions live in their own tables;
//! passwords are Argon2id hashes and sessions are stored by token digest.
//!
//! Every read-check-write runs in a `BEGIN IMMEDIATE` transaction, so
//! concurrent merges queue on the busy timeout instead of failing.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqliteConnectOptions, SqliteExecutor, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tokio::sync::watch;
use uuid::Uuid;

use super::crypto;
use super::rules::{self, Actor, WriteOp};
use super::{AuthState, Directory, DirectoryError, Document, USERS};
use crate::model::{Role, Session};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "tracklist.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// How long a writer waits for another connection's lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Run password hashing on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, DirectoryError>
where
    F: FnOnce() -> Result<T, DirectoryError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DirectoryError::PasswordHash(e.to_string()))?
}

fn decode(collection: &str, id: &str, raw: &str) -> Result<Document, DirectoryError> {
    let malformed = |message: String| DirectoryError::Malformed {
        collection: collection.to_string(),
        id: id.to_string(),
        message,
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(malformed(format!("expected an object, got {}", other))),
        Err(e) => Err(malformed(e.to_string())),
    }
}

async fn fetch_doc<'e, E: SqliteExecutor<'e>>(
    executor: E,
    collection: &str,
    id: &str,
) -> Result<Option<Document>, DirectoryError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT fields FROM records WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(executor)
            .await?;

    row.map(|(raw,)| decode(collection, id, &raw)).transpose()
}

async fn store_doc<'e, E: SqliteExecutor<'e>>(
    executor: E,
    collection: &str,
    id: &str,
    doc: Document,
) -> Result<(), DirectoryError> {
    sqlx::query(
        "INSERT INTO records (collection, id, fields, updated_at) VALUES (?, ?, ?, ?)
         ON CONFLICT(collection, id) DO UPDATE SET fields = excluded.fields, updated_at = excluded.updated_at",
    )
    .bind(collection)
    .bind(id)
    .bind(Value::Object(doc).to_string())
    .bind(now())
    .execute(executor)
    .await?;
    Ok(())
}

fn decode_rows(
    collection: &str,
    rows: Vec<(String, String)>,
) -> Result<Vec<(String, Document)>, DirectoryError> {
    rows.into_iter()
        .map(|(id, raw)| decode(collection, &id, &raw).map(|doc| (id, doc)))
        .collect()
}

/// Directory stored in a local SQLite database.
pub struct SqliteDirectory {
    pool: SqlitePool,
    auth: watch::Sender<AuthState>,
}

impl SqliteDirectory {
    /// Open (creating if needed) the database and run migrations.
    pub async fn open(db_url: &str) -> Result<Self, DirectoryError> {
        if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
            sqlx::Sqlite::create_database(db_url).await?;
        }

        let options = SqliteConnectOptions::from_str(db_url)?.busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let (auth, _) = watch::channel(AuthState::SignedOut);
        Ok(Self { pool, auth })
    }

    /// Start a transaction that holds the write lock from its first statement.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, DirectoryError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Resolve a session to the verified actor behind it.
    async fn authenticate(&self, session: &Session) -> Result<Actor, DirectoryError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT uid FROM sessions WHERE token_hash = ?")
            .bind(crypto::hash_token(&session.token))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((uid,)) if uid == session.user_id => {
                let role = fetch_doc(&self.pool, USERS, &uid)
                    .await?
                    .and_then(|doc| doc.get("role").and_then(|v| v.as_str()).map(str::to_owned))
                    .and_then(|r| r.parse().ok())
                    .unwrap_or_default();
                Ok(Actor { user_id: uid, role })
            }
            _ => Err(DirectoryError::SessionExpired),
        }
    }

    /// Set a user's role without going through the access rules.
    ///
    /// This is the operator path for bootstrapping the first Admin and for
    /// revoking Admin, which no signed-in user can do.
    pub async fn set_role_out_of_band(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<(), DirectoryError> {
        let mut tx = self.begin_write().await?;
        let mut doc = fetch_doc(&mut *tx, USERS, user_id)
            .await?
            .ok_or_else(|| DirectoryError::NotFound {
                collection: USERS.to_string(),
                id: user_id.to_string(),
            })?;
        doc.insert("role".to_string(), Value::String(role.as_str().to_string()));
        store_doc(&mut *tx, USERS, user_id, doc).await?;
        tx.commit().await?;

        tracing::info!(user_id, %role, "Role set out of band");
        Ok(())
    }

    /// Look up a uid by email address.
    pub async fn find_uid(&self, email: &str) -> Result<Option<String>, DirectoryError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT uid FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(uid,)| uid))
    }
}

#[async_trait]
impl Directory for SqliteDirectory {
    async fn create_account(&self, email: &str, password: &str) -> Result<String, DirectoryError> {
        if self.find_uid(email).await?.is_some() {
            return Err(DirectoryError::EmailInUse(email.to_string()));
        }

        let uid = Uuid::new_v4().simple().to_string();
        let password = password.to_string();
        let password_hash = blocking(move || crypto::hash_password(&password)).await?;
        let result = sqlx::query(
            "INSERT INTO accounts (uid, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&uid)
        .bind(email)
        .bind(password_hash)
        .bind(now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!(uid = %uid, "Account created");
                Ok(uid)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DirectoryError::EmailInUse(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, DirectoryError> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT uid, email, password_hash FROM accounts WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        let Some((uid, stored_email, hash)) = row else {
            return Err(DirectoryError::InvalidCredentials);
        };
        let password = password.to_string();
        if !blocking(move || crypto::verify_password(&password, &hash)).await? {
            return Err(DirectoryError::InvalidCredentials);
        }

        let token = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO sessions (token_hash, uid, created_at) VALUES (?, ?, ?)")
            .bind(crypto::hash_token(&token))
            .bind(&uid)
            .bind(now())
            .execute(&self.pool)
            .await?;

        let session = Session {
            user_id: uid,
            email: stored_email,
            token,
        };
        tracing::debug!(uid = %session.user_id, "Signed in");
        self.auth.send_replace(AuthState::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), DirectoryError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(crypto::hash_token(&session.token))
            .execute(&self.pool)
            .await?;
        self.auth.send_replace(AuthState::SignedOut);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), DirectoryError> {
        let Some(uid) = self.find_uid(email).await? else {
            tracing::debug!("Password reset requested for unknown address");
            return Ok(());
        };

        sqlx::query("INSERT INTO password_resets (uid, email, requested_at) VALUES (?, ?, ?)")
            .bind(&uid)
            .bind(email)
            .bind(now())
            .execute(&self.pool)
            .await?;
        tracing::info!(uid = %uid, "Password reset requested");
        Ok(())
    }

    async fn delete_account(&self, session: &Session) -> Result<(), DirectoryError> {
        let actor = self.authenticate(session).await?;

        let mut tx = self.begin_write().await?;
        sqlx::query("DELETE FROM sessions WHERE uid = ?")
            .bind(&actor.user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM accounts WHERE uid = ?")
            .bind(&actor.user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(uid = %actor.user_id, "Account deleted");
        self.auth.send_replace(AuthState::SignedOut);
        Ok(())
    }

    async fn get_record(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, DirectoryError> {
        fetch_doc(&self.pool, collection, id).await
    }

    async fn set_record(
        &self,
        actor: &Session,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), DirectoryError> {
        let actor = self.authenticate(actor).await?;

        let mut tx = self.begin_write().await?;
        let current = fetch_doc(&mut *tx, collection, id).await?;
        let op = if current.is_some() {
            WriteOp::Update
        } else {
            WriteOp::Create
        };
        rules::check_write(&actor, collection, id, op, current.as_ref(), &fields)
            .map_err(|denial| DirectoryError::PermissionDenied(denial.to_string()))?;

        let mut merged = current.unwrap_or_default();
        merged.extend(fields);
        store_doc(&mut *tx, collection, id, merged).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn add_record(
        &self,
        actor: &Session,
        collection: &str,
        mut fields: Document,
    ) -> Result<String, DirectoryError> {
        let actor = self.authenticate(actor).await?;
        let id = Uuid::new_v4().simple().to_string();

        rules::check_write(&actor, collection, &id, WriteOp::Create, None, &fields)
            .map_err(|denial| DirectoryError::PermissionDenied(denial.to_string()))?;

        fields.insert("createdAt".to_string(), Value::String(now()));
        store_doc(&self.pool, collection, &id, fields).await?;
        Ok(id)
    }

    async fn delete_record(
        &self,
        actor: &Session,
        collection: &str,
        id: &str,
    ) -> Result<(), DirectoryError> {
        let actor = self.authenticate(actor).await?;

        let mut tx = self.begin_write().await?;
        let current = fetch_doc(&mut *tx, collection, id).await?;
        rules::check_write(
            &actor,
            collection,
            id,
            WriteOp::Delete,
            current.as_ref(),
            &Document::new(),
        )
        .map_err(|denial| DirectoryError::PermissionDenied(denial.to_string()))?;

        sqlx::query("DELETE FROM records WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn query_records(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Document)>, DirectoryError> {
        let path = format!("$.\"{}\"", field.replace('"', ""));
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT id, fields FROM records
             WHERE collection = ? AND json_extract(fields, ?) = json_extract(?, '$')
             ORDER BY rowid",
        )
        .bind(collection)
        .bind(path)
        .bind(value.to_string())
        .fetch_all(&self.pool)
        .await?;

        decode_rows(collection, rows)
    }

    async fn list_records(
        &self,
        collection: &str,
    ) -> Result<Vec<(String, Document)>, DirectoryError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, fields FROM records WHERE collection = ? ORDER BY rowid")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;

        decode_rows(collection, rows)
    }

    fn subscribe_auth(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }
}
