//! Password and session-token hashing.
//!
//! Passwords are stored as Argon2id PHC strings, which carry their own salt
//! and parameters. Session tokens are opaque bearer values; only their
//! SHA-256 digest is persisted.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};
use rand::Rng;
use sha2::{Digest, Sha256};

use super::DirectoryError;

const SALT_LENGTH: usize = Salt::RECOMMENDED_LENGTH;

fn hash_error(err: argon2::password_hash::Error) -> DirectoryError {
    DirectoryError::PasswordHash(err.to_string())
}

/// Hash `password` with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, DirectoryError> {
    let salt_bytes: [u8; SALT_LENGTH] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(hash_error)?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(hash_error)?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, DirectoryError> {
    let parsed = PasswordHash::new(stored).map_err(hash_error)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Digest of a session token as stored in the database.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashes_passwords_and_verifies() {
        let hash = hash_password("Secret1!x").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Secret1!x", &hash).unwrap());
        assert!(!verify_password("Secret1!y", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let first = hash_password("Secret1!x").unwrap();
        let second = hash_password("Secret1!x").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(matches!(
            verify_password("Secret1!x", "not-a-phc-string"),
            Err(DirectoryError::PasswordHash(_))
        ));
    }

    #[test]
    fn test_token_digest_is_hex() {
        let digest = hash_token("opaque-token");

        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(digest, "opaque-token");
        assert_eq!(digest, hash_token("opaque-token"));
    }
}
