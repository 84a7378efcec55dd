//! Test utilities and fixtures for tracklist tests.
//!
//! # Example
//!
//! ```ignore
//! use tracklist::test_utils::{temp_directory, user_with_role};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (dir, _tmp) = temp_directory().await;
//!     let admin = user_with_role(&dir, "admin@example.com", "Admin", Role::Admin).await;
//!     // ... test logic
//! }
//! ```

use serde_json::{Value, json};
use tempfile::TempDir;

use crate::directory::{Directory, Document, SqliteDirectory, USERS};
use crate::model::{Role, Session};

/// Password accepted by every validation rule.
pub const TEST_PASSWORD: &str = "Secret1!x";

/// Creates a temporary directory database for testing.
///
/// The database lives in a temporary directory that is removed when the
/// returned `TempDir` is dropped. Keep it alive for the whole test.
pub async fn temp_directory() -> (SqliteDirectory, TempDir) {
    let tmp = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = tmp.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let dir = SqliteDirectory::open(&db_url)
        .await
        .expect("Failed to initialize test directory");

    (dir, tmp)
}

/// Turn a `json!` object literal into a [`Document`].
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// Create an account with a Regular profile and sign it in.
pub async fn regular_user(dir: &SqliteDirectory, email: &str, name: &str) -> Session {
    let uid = dir
        .create_account(email, TEST_PASSWORD)
        .await
        .expect("Failed to create account");
    let session = dir
        .sign_in(email, TEST_PASSWORD)
        .await
        .expect("Failed to sign in");

    dir.set_record(
        &session,
        USERS,
        &uid,
        doc(json!({
            "uid": uid,
            "fullName": name,
            "email": email,
            "role": "Regular",
        })),
    )
    .await
    .expect("Failed to write profile");

    session
}

/// Like [`regular_user`], then assign `role` out of band.
pub async fn user_with_role(
    dir: &SqliteDirectory,
    email: &str,
    name: &str,
    role: Role,
) -> Session {
    let session = regular_user(dir, email, name).await;
    if role != Role::Regular {
        dir.set_role_out_of_band(&session.user_id, role)
            .await
            .expect("Failed to set role");
    }
    session
}

/// Stored role of `user_id`, read straight from the directory.
pub async fn stored_role(dir: &SqliteDirectory, user_id: &str) -> Option<String> {
    dir.get_record(USERS, user_id)
        .await
        .expect("Failed to read profile")
        .and_then(|doc| doc.get("role").and_then(|v| v.as_str()).map(str::to_owned))
}
