//! Input validation for submitted URLs
//!
//! Pure checks with no storage access. The caller supplies the set of
//! shortcodes already in use.

use std::collections::HashSet;

use serde_json::Value;
use url::Url;

use crate::error::ValidationError;
use crate::model::DEFAULT_VALIDITY_MINUTES;

pub const MIN_SHORTCODE_LENGTH: usize = 3;
pub const MAX_SHORTCODE_LENGTH: usize = 20;

/// Accepts absolute `http`/`https` URLs only
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    tracing::debug!(url, "Validating URL");

    if url.is_empty() {
        return Err(ValidationError::InvalidUrl("URL is required"));
    }

    // Url::parse silently drops tabs and newlines
    if url.chars().any(char::is_control) {
        return Err(ValidationError::InvalidUrl("Invalid URL format"));
    }

    // Url::parse rejects relative references outright
    let parsed = Url::parse(url).map_err(|e| {
        tracing::debug!(url, error = %e, "Invalid URL format");
        ValidationError::InvalidUrl("Invalid URL format")
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::InvalidUrl(
            "URL must start with http:// or https://",
        )),
    }
}

/// Resolves the validity period in whole minutes
///
/// Missing, `null` and blank input fall back to 30 minutes. Numbers,
/// numeric strings and booleans must come out finite and at least 1;
/// fractions are truncated.
pub fn validate_validity(raw: Option<&Value>) -> Result<u64, ValidationError> {
    tracing::debug!(validity = ?raw, "Validating validity period");

    let number = match raw {
        None | Some(Value::Null) => return Ok(DEFAULT_VALIDITY_MINUTES),
        Some(Value::String(s)) if s.is_empty() => return Ok(DEFAULT_VALIDITY_MINUTES),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidValidity)?,
        Some(Value::Number(n)) => n.as_f64().ok_or(ValidationError::InvalidValidity)?,
        // booleans coerce to 1 and 0
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(_) => return Err(ValidationError::InvalidValidity),
    };

    if !number.is_finite() || number < 1.0 {
        return Err(ValidationError::InvalidValidity);
    }

    // float-to-int casts saturate
    Ok(number.floor() as u64)
}

/// Checks an optional custom shortcode: format, then length, then uniqueness
pub fn validate_shortcode(code: &str, existing: &HashSet<String>) -> Result<(), ValidationError> {
    tracing::debug!(shortcode = code, "Validating shortcode");

    if code.is_empty() {
        return Ok(());
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidShortcodeFormat);
    }

    if code.len() < MIN_SHORTCODE_LENGTH || code.len() > MAX_SHORTCODE_LENGTH {
        return Err(ValidationError::InvalidShortcodeLength);
    }

    if existing.contains(code) {
        return Err(ValidationError::ShortcodeTaken);
    }

    Ok(())
}
