//! Validation helpers for DTOs.

use validator::ValidationError;

/// Reason reported for a missing or whitespace-only value.
pub const BLANK_MESSAGE: &str = "must not be blank";

/// Validates that a value is present and contains at least one non-whitespace character.
///
/// # Examples
///
/// ```ignore
/// validate_not_blank(Some("Tetris")) // Ok
/// validate_not_blank(Some("   "))    // Err - whitespace only
/// validate_not_blank(None)           // Err - missing
/// ```
pub fn validate_not_blank(value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => {
            let mut err = ValidationError::new("not_blank");
            err.message = Some(BLANK_MESSAGE.into());
            Err(err)
        }
    }
}
