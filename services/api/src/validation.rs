//! Input validation utilities

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum accepted password length
pub const MAX_PASSWORD_LENGTH: usize = 128;
/// Maximum length of names, titles and links
pub const MAX_TEXT_LENGTH: usize = 255;
/// Total digits allowed in a price
pub const PRICE_MAX_DIGITS: u32 = 5;
/// Fractional digits allowed in a price
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Enter a valid email address".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

/// Validate a required, length-limited text field such as a name or title
pub fn validate_required_text(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }

    validate_optional_text(value, label)
}

/// Validate an optional, length-limited text field
pub fn validate_optional_text(value: &str, label: &str) -> Result<(), String> {
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(format!(
            "{} must be at most {} characters long",
            label, MAX_TEXT_LENGTH
        ));
    }

    Ok(())
}

/// Validate a preparation time in minutes
pub fn validate_time_minutes(minutes: i32) -> Result<(), String> {
    if minutes < 0 {
        return Err("Ensure this value is greater than or equal to 0".to_string());
    }

    Ok(())
}

/// Validate a price: non-negative, at most 5 digits, at most 2 of them fractional
pub fn validate_price(price: &Decimal) -> Result<(), String> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Ensure this value is greater than or equal to 0".to_string());
    }

    let normalized = price.normalize();

    if normalized.scale() > PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} decimal places",
            PRICE_DECIMAL_PLACES
        ));
    }

    let limit = Decimal::from(10_i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES));
    if normalized >= limit {
        return Err(format!(
            "Ensure that there are no more than {} digits in total",
            PRICE_MAX_DIGITS
        ));
    }

    Ok(())
}
