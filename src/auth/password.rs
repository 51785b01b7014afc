/// Password Hashing and Verification
///
/// Handles password hashing and verification with bcrypt. The plaintext
/// password is never logged and never part of an error message.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;
use std::error::Error as StdError;
use std::fmt;

const UNKNOWN_ACCOUNT_PASSWORD: &str = "unknown-account-placeholder";

lazy_static! {
    // Verified against when the claimed account does not exist, so a
    // login for an unknown email costs as much as one with a wrong password.
    static ref UNKNOWN_ACCOUNT_HASH: Result<String, PasswordError> =
        hash_password(UNKNOWN_ACCOUNT_PASSWORD);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The password does not match the stored hash
    Mismatch,
    /// The stored hash could not be parsed
    MalformedHash,
    /// bcrypt could not produce a hash (entropy or cost failure)
    Hashing(String),
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordError::Mismatch => write!(f, "password does not match"),
            PasswordError::MalformedHash => write!(f, "stored password hash is malformed"),
            PasswordError::Hashing(msg) => write!(f, "password hashing failed: {}", msg),
        }
    }
}

impl StdError for PasswordError {}

/// Hash a password using bcrypt
///
/// The result embeds algorithm, cost and a fresh salt, so two hashes of the
/// same password never compare equal.
///
/// # Errors
/// Returns `PasswordError::Hashing` if bcrypt fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash(password, DEFAULT_COST).map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Verify a password against its hash
///
/// # Errors
/// - `PasswordError::Mismatch` when the password is wrong
/// - `PasswordError::MalformedHash` when the stored hash is unusable
pub fn verify_password(password_hash: &str, password: &str) -> Result<(), PasswordError> {
    match verify(password, password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(PasswordError::Mismatch),
        // bcrypt's error payload can echo the hash back; drop it.
        Err(_) => Err(PasswordError::MalformedHash),
    }
}

/// Build the unknown-account hash up front
///
/// Call once at startup so no login request pays for it.
///
/// # Errors
/// Returns `PasswordError::Hashing` if bcrypt could not produce the hash
pub fn prepare_unknown_account_hash() -> Result<(), PasswordError> {
    UNKNOWN_ACCOUNT_HASH.as_ref().map(|_| ()).map_err(Clone::clone)
}

/// Burn one bcrypt verification without a real account
pub fn simulate_verification(password: &str) {
    match UNKNOWN_ACCOUNT_HASH.as_ref() {
        Ok(stored) => {
            let _ = verify(password, stored);
        }
        // Same cost as a verification, never a shortcut.
        Err(_) => {
            let _ = hash(password, DEFAULT_COST);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("ValidPassword123").expect("Failed to hash password");

        assert_eq!(verify_password(&hash, "ValidPassword123"), Ok(()));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("ValidPassword123").expect("Failed to hash password");

        assert_eq!(
            verify_password(&hash, "WrongPassword123"),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("SamePassword1").expect("Failed to hash password");
        let second = hash_password("SamePassword1").expect("Failed to hash password");

        assert_ne!(first, second);
        assert!(verify_password(&first, "SamePassword1").is_ok());
        assert!(verify_password(&second, "SamePassword1").is_ok());
    }

    #[test]
    fn test_malformed_hash_is_not_a_mismatch() {
        let result = verify_password("not-a-bcrypt-hash", "whatever");

        assert_eq!(result, Err(PasswordError::MalformedHash));
    }

    #[test]
    fn test_error_message_does_not_echo_hash() {
        let stored = "$2b$12$definitelynotvalid";
        let err = verify_password(stored, "whatever").unwrap_err();

        assert!(!err.to_string().contains(stored));
    }

    #[test]
    fn test_unknown_account_hash_is_a_real_hash() {
        assert_eq!(prepare_unknown_account_hash(), Ok(()));

        let stored = UNKNOWN_ACCOUNT_HASH.as_ref().expect("hash prepared");
        assert!(stored.starts_with("$2"));
        assert_eq!(verify_password(stored, UNKNOWN_ACCOUNT_PASSWORD), Ok(()));
    }

    #[test]
    fn test_simulate_verification_does_not_panic() {
        simulate_verification("anything at all");
    }
}
