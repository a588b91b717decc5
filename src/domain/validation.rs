//! Input validation shared by the fitness resources

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur while validating drafts and patches
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Field '{0}' cannot be empty")]
    EmptyField(&'static str),

    #[error("Field '{field}' exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),

    #[error("Field '{field}' must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Field '{field}' has invalid value: {reason}")]
    Invalid { field: &'static str, reason: String },
}

const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$")
        .unwrap_or_else(|e| panic!("email regex must compile: {}", e))
});

/// Validate a required text field
///
/// Rules:
/// - Cannot be empty or whitespace only
/// - Cannot exceed `max` characters
pub fn validate_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(())
}

/// Validate an optional text field, only checking length when present
pub fn validate_optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        _ => Ok(()),
    }
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email",
            max: MAX_EMAIL_LENGTH,
        });
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

/// Validate that a numeric value lies within an inclusive range
pub fn validate_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if value.is_nan() || value < min || value > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }

    Ok(())
}

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        assert!(validate_text("name", "Rowing machine", 100).is_ok());
        assert_eq!(
            validate_text("name", "   ", 100),
            Err(ValidationError::EmptyField("name"))
        );
        assert_eq!(
            validate_text("name", "abcdef", 5),
            Err(ValidationError::TooLong {
                field: "name",
                max: 5
            })
        );
    }

    #[test]
    fn test_validate_optional_text() {
        assert!(validate_optional_text("notes", None, 5).is_ok());
        assert!(validate_optional_text("notes", Some("short"), 5).is_ok());
        assert!(validate_optional_text("notes", Some("too long"), 5).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("runner@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("weight_kg", 80.0, 20.0, 400.0).is_ok());
        assert!(validate_range("weight_kg", 10.0, 20.0, 400.0).is_err());
        assert!(validate_range("weight_kg", f64::NAN, 20.0, 400.0).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Runner@Example.COM "), "runner@example.com");
    }
}
