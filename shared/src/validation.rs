//! Validation utilities for the AquaMon platform

/// Validate the mobile number used for the one-time-code flow.
///
/// Exactly 10 digits, nothing else: separators and country codes are the
/// caller's problem, the verification screen asks for the bare number.
pub fn validate_phone_number(phone: &str) -> Result<(), &'static str> {
    if phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("Please enter a valid 10-digit phone number")
    }
}

/// Require a non-blank registration field.
pub fn require_non_empty(value: &str, message: &'static str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err(message)
    } else {
        Ok(())
    }
}
