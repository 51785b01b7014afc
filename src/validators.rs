/// Input validators for account creation and update
/// Features:
/// 1. DoS Protection: Input length limits
/// 2. Email format validation
/// 3. Password policy (bcrypt only looks at the first 72 bytes)

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt input limit in bytes

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(trimmed.to_string())
}

/// Validates a new password
///
/// Requirements:
/// - 8 to 72 bytes
/// - At least one digit, one lowercase and one uppercase letter
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::WeakPassword);
    }

    Ok(())
}

/// Login only needs both fields present; policy applies when passwords are set
pub fn require_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_is_trimmed() {
        assert_eq!(
            is_valid_email("  walt@breakingbad.com ").unwrap(),
            "walt@breakingbad.com"
        );
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        assert_eq!(is_valid_email("a@b"), Err(ValidationError::TooShort("email", 5)));
    }

    #[test]
    fn test_valid_password() {
        assert!(is_valid_password("ValidPassword123").is_ok());
    }

    #[test]
    fn test_password_length_limits() {
        assert!(is_valid_password("Short1").is_err());
        let too_long = "a".repeat(MAX_PASSWORD_LENGTH) + "A1";
        assert!(is_valid_password(&too_long).is_err());
        assert_eq!(is_valid_password(""), Err(ValidationError::EmptyField("password")));
    }

    #[test]
    fn test_password_character_classes() {
        assert_eq!(is_valid_password("NoDigitsPassword"), Err(ValidationError::WeakPassword));
        assert_eq!(is_valid_password("NOLOWERCASE1"), Err(ValidationError::WeakPassword));
        assert_eq!(is_valid_password("nouppercase1"), Err(ValidationError::WeakPassword));
    }

    #[test]
    fn test_require_credentials() {
        assert!(require_credentials("a@b.com", "x").is_ok());
        assert_eq!(
            require_credentials(" ", "x"),
            Err(ValidationError::EmptyField("email"))
        );
        assert_eq!(
            require_credentials("a@b.com", ""),
            Err(ValidationError::EmptyField("password"))
        );
    }
}
