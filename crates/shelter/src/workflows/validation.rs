//! Field checks shared by the intake forms.

use regex::Regex;

lazy_static::lazy_static! {
    static ref PHONE_PATTERN: Regex =
        Regex::new(r"^\+?1?\d{9,15}$").expect("phone pattern compiles");

    static ref EMAIL_PATTERN: Regex = Regex::new(
        r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$"
    ).expect("e-mail pattern compiles");
}

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trims `value` and rejects it when empty or longer than `max_len` characters.
pub fn required_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, "is required"));
    }
    if trimmed.chars().count() > max_len {
        return Err(FieldError::new(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`] but an empty value is allowed.
pub fn optional_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        return Ok(String::new());
    }
    required_text(field, value, max_len)
}

pub fn email(field: &'static str, value: &str) -> Result<String, FieldError> {
    let trimmed = required_text(field, value, 254)?;
    if EMAIL_PATTERN.is_match(&trimmed) {
        Ok(trimmed)
    } else {
        Err(FieldError::new(field, "must be a valid e-mail address"))
    }
}

/// Phone numbers in the `+999999999` shape: optional `+`, optional leading `1`,
/// then 9 to 15 digits.
pub fn phone(field: &'static str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if PHONE_PATTERN.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(FieldError::new(
            field,
            "must look like '+999999999' with up to 15 digits",
        ))
    }
}
