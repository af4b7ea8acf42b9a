//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a team abbreviation is 2 to 5 uppercase ASCII letters or digits.
///
/// # Examples
///
/// ```ignore
/// validate_abbreviation("MTL")   // Ok
/// validate_abbreviation("mtl")   // Err - lowercase
/// validate_abbreviation("M")     // Err - too short
/// ```
pub fn validate_abbreviation(value: &str) -> Result<(), ValidationError> {
    if !(2..=5).contains(&value.len()) {
        let mut err = ValidationError::new("abbreviation_length");
        err.message = Some(
            format!(
                "Abbreviation must be 2 to 5 characters (got {})",
                value.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("abbreviation_format");
        err.message = Some("Abbreviation must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Rejects names made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}
