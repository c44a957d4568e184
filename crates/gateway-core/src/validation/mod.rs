//! Input validation.
//!
//! Every function here is pure and total: invalid input is reported in the
//! return value, never by panicking or erroring.

mod sanitize;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{ALLOWED_MIME_TYPES, MAX_FILE_SIZE};
use crate::error::{GatewayError, GatewayResult};

pub use sanitize::sanitize_rich_text;

/// Characters that satisfy the "special character" password rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Outcome of a validation that accumulates every violated rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn into_result(self) -> GatewayResult<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(GatewayError::Validation(self.errors))
        }
    }
}

/// Whether `text`, ignoring surrounding whitespace, is between `min` and
/// `max` characters long (inclusive).
pub fn validate_length(text: &str, min: usize, max: usize) -> bool {
    let len = text.trim().chars().count();
    len >= min && len <= max
}

static DANGEROUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<\s*script\b",
        r"(?i)javascript\s*:",
        r"(?i)vbscript\s*:",
        r"(?i)data\s*:\s*text/html",
        r"(?i)<[^>]*\bon[a-z]+\s*=",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("static pattern compiles"))
    .collect()
});

/// Cheap first-pass screen for obviously hostile markup.
///
/// Encoding tricks get past this. [`sanitize_rich_text`] is what actually
/// makes content safe to render.
pub fn validate_content_safety(text: &str) -> bool {
    !DANGEROUS_PATTERNS.iter().any(|re| re.is_match(text))
}

pub fn validate_password_strength(password: &str) -> ValidationResult {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        errors.push("Password must contain at least one special character".to_string());
    }

    ValidationResult::from_errors(errors)
}

pub fn validate_file(size: u64, mime_type: &str) -> ValidationResult {
    let mut errors = Vec::new();

    if size > MAX_FILE_SIZE {
        errors.push(format!(
            "File size must be at most {}MB",
            MAX_FILE_SIZE / (1024 * 1024)
        ));
    }
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        errors.push("Only JPEG, PNG, GIF and WebP images are allowed".to_string());
    }

    ValidationResult::from_errors(errors)
}
