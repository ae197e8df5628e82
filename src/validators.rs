/// Input validators
///
/// Every function trims its input and returns the cleaned value, so callers
/// store exactly what was validated.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MAX_CLASS_ROOM_LENGTH: usize = 16;
const MAX_TITLE_LENGTH: usize = 512;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*$").unwrap();

    static ref CLASS_ROOM_REGEX: Regex = Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} .-]*$").unwrap();
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

/// Validates a person's first or last name
pub fn is_valid_name(field: &str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_NAME_LENGTH));
    }

    if has_suspicious_name_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent(field.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a login handle used by admins to address accounts
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort(
            "username".to_string(),
            MIN_USERNAME_LENGTH,
        ));
    }

    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_class_room(class_room: &str) -> Result<String, ValidationError> {
    let trimmed = class_room.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("classRoom".to_string()));
    }

    if trimmed.chars().count() > MAX_CLASS_ROOM_LENGTH {
        return Err(ValidationError::TooLong(
            "classRoom".to_string(),
            MAX_CLASS_ROOM_LENGTH,
        ));
    }

    if !CLASS_ROOM_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("classRoom".to_string()));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_book_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("bookTitle".to_string()));
    }

    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong(
            "bookTitle".to_string(),
            MAX_TITLE_LENGTH,
        ));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("bookTitle".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Detects suspicious patterns in email addresses
fn has_suspicious_email_patterns(email: &str) -> bool {
    // Local part over 64 characters
    if let Some(at_pos) = email.find('@') {
        if at_pos > 64 {
            return true;
        }
    }

    if email.matches('@').count() != 1 {
        return true;
    }

    email.contains('\0')
}

/// Detects suspicious patterns in names
fn has_suspicious_name_patterns(name: &str) -> bool {
    if name.chars().any(|c| c.is_control()) {
        return true;
    }

    let special_char_count = name
        .chars()
        .filter(|c| {
            !c.is_alphanumeric()
                && !c.is_whitespace()
                && *c != '-'
                && *c != '.'
                && *c != '_'
                && *c != '\''
        })
        .count();

    special_char_count > 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email("  user@example.com ").unwrap(), "user@example.com");
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
        assert!(is_valid_email("a@b").is_err());
        assert!(is_valid_email("").is_err());
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("name", "John Doe").is_ok());
        assert!(is_valid_name("name", "Jean-Pierre").is_ok());
        assert!(is_valid_name("lastName", "O'Brien").is_ok());
        assert!(is_valid_name("lastName", "Kováčová").is_ok());
    }

    #[test]
    fn test_name_errors_carry_field() {
        assert_eq!(
            is_valid_name("lastName", "  "),
            Err(ValidationError::EmptyField("lastName".to_string()))
        );
        let too_long = "a".repeat(257);
        assert!(is_valid_name("name", &too_long).is_err());
    }

    #[test]
    fn test_control_characters() {
        assert!(is_valid_name("name", "Name\0with\0null").is_err());
    }

    #[test]
    fn test_excessive_special_characters() {
        assert!(is_valid_name("name", "!!!!!!@@@@").is_err());
    }

    #[test]
    fn test_username() {
        assert!(is_valid_username("jnovak").is_ok());
        assert!(is_valid_username("j.novak_2").is_ok());
        assert!(is_valid_username("ab").is_err());
        assert!(is_valid_username("has space").is_err());
        assert!(is_valid_username("-leading").is_err());
        assert!(is_valid_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_class_room() {
        assert!(is_valid_class_room("1A").is_ok());
        assert!(is_valid_class_room("IV.B").is_ok());
        assert!(is_valid_class_room("").is_err());
        assert!(is_valid_class_room("1A; drop").is_err());
    }

    #[test]
    fn test_book_title() {
        assert_eq!(is_valid_book_title(" Dune ").unwrap(), "Dune");
        assert!(is_valid_book_title("").is_err());
        assert!(is_valid_book_title("bad\ttitle").is_err());
    }
}
