/// Password Hashing and Verification
///
/// bcrypt with a configurable cost. bcrypt only reads the first 72 bytes of
/// its input, so longer passwords are rejected instead of silently truncated.

use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if the password fails validation or bcrypt hashing fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    validate_password(password)?;

    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// The comparison inside bcrypt is constant-time.
///
/// # Errors
/// Returns error if `hash` is not a valid bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Password requirements: present and at most 72 bytes
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 10;

    #[test]
    fn test_hash_password() {
        let password = "pw123456";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert_ne!(password, hash);
        // bcrypt identifier and cost
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$10$"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("pw123456", TEST_COST).unwrap();
        let second = hash_password("pw123456", TEST_COST).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("pw123456", TEST_COST).expect("Failed to hash password");

        let is_valid = verify_password("pw123456", &hash).expect("Failed to verify password");
        assert!(is_valid);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("pw123456", TEST_COST).expect("Failed to hash password");

        let is_valid = verify_password("pw1234567", &hash).expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(verify_password("pw123456", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn test_empty_password() {
        assert_eq!(
            validate_password(""),
            Err(ValidationError::EmptyField("password"))
        );
    }

    #[test]
    fn test_too_long_password() {
        let long_password = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(hash_password(&long_password, TEST_COST).is_err());
        assert!(validate_password(&"a".repeat(MAX_PASSWORD_LENGTH)).is_ok());
    }
}
