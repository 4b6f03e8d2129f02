/// Input validators
///
/// Format checks for account identifiers. They also drive login identifier
/// resolution, so "looks like a phone" and "is an email" must stay cheap and
/// side-effect free.
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NICKNAME_LENGTH: usize = 64;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");

    // Local phone layout, e.g. 90-123-45-67. Matched anywhere in the input.
    static ref PHONE_REGEX: Regex = Regex::new(r"\d{2}-\d{3}-\d{2}-\d{2}")
        .expect("phone regex is valid");
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// True when the input contains a phone number in the `dd-ddd-dd-dd` layout
pub fn looks_like_phone(input: &str) -> bool {
    PHONE_REGEX.is_match(input)
}

/// Validates an author nick name and returns it trimmed
pub fn is_valid_nickname(nick_name: &str) -> Result<String, ValidationError> {
    let trimmed = nick_name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("nick_name".to_string()));
    }

    if trimmed.chars().count() > MAX_NICKNAME_LENGTH {
        return Err(ValidationError::TooLong("nick_name".to_string(), MAX_NICKNAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ValidationError::SuspiciousContent("nick_name".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Checks a plaintext password before it is hashed.
///
/// Only presence and an upper bound are enforced; strength rules belong to
/// the request schema layer.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    if let Some(at_pos) = email.find('@') {
        if at_pos > 64 {
            return true;
        }
    }

    email.matches('@').count() != 1 || email.contains('\0')
}
