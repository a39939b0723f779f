use chrono::{NaiveDate, NaiveTime};

use crate::error::ClinicError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Lowercases and trims an identifier, rejecting empty ones
pub fn normalize_identifier(identifier: &str) -> Result<String, ClinicError> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(ClinicError::invalid("Username is required"));
    }
    if trimmed.contains(char::is_whitespace) {
        return Err(ClinicError::invalid("Username must not contain spaces"));
    }
    Ok(trimmed.to_lowercase())
}

/// Validates the credentials of a new account
pub fn validate_registration(identifier: &str, secret: &str) -> Result<String, ClinicError> {
    let identifier = normalize_identifier(identifier)?;
    if secret.trim().is_empty() {
        return Err(ClinicError::invalid("Password is required"));
    }
    Ok(identifier)
}

/// Accepts `YYYY-MM-DD` naming a real calendar day
pub fn validate_date(date: &str) -> Result<String, ClinicError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(ClinicError::invalid("Date is required"));
    }
    // chrono accepts single-digit fields, the stored form must sort as text
    if date.len() != 10 {
        return Err(ClinicError::invalid(format!("Date '{}' must be YYYY-MM-DD", date)));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ClinicError::invalid(format!("Date '{}' must be YYYY-MM-DD", date)))?;
    Ok(date.to_string())
}

/// Accepts `HH:MM` on a 24 hour clock
pub fn validate_time(time: &str) -> Result<String, ClinicError> {
    let time = time.trim();
    if time.is_empty() {
        return Err(ClinicError::invalid("Time is required"));
    }
    if time.len() != 5 {
        return Err(ClinicError::invalid(format!("Time '{}' must be HH:MM", time)));
    }
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| ClinicError::invalid(format!("Time '{}' must be HH:MM", time)))?;
    Ok(time.to_string())
}

pub fn validate_rating(rating: i64) -> Result<u8, ClinicError> {
    if rating < i64::from(MIN_RATING) || rating > i64::from(MAX_RATING) {
        return Err(ClinicError::invalid(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(rating as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_lowercased_and_trimmed() {
        assert_eq!(normalize_identifier("  Alice ").unwrap(), "alice");
        assert!(normalize_identifier("   ").is_err());
        assert!(normalize_identifier("al ice").is_err());
    }

    #[test]
    fn dates_must_be_padded_and_real() {
        assert_eq!(validate_date("2025-05-01").unwrap(), "2025-05-01");
        assert!(validate_date("2025-5-1").is_err());
        assert!(validate_date("2025-02-30").is_err());
        assert!(validate_date("01/05/2025").is_err());
        assert!(validate_date("").is_err());
    }

    #[test]
    fn times_must_be_padded_and_real() {
        assert_eq!(validate_time("09:00").unwrap(), "09:00");
        assert!(validate_time("9:00").is_err());
        assert!(validate_time("24:00").is_err());
        assert!(validate_time("12:60").is_err());
    }

    #[test]
    fn rating_bounds() {
        assert_eq!(validate_rating(1).unwrap(), 1);
        assert_eq!(validate_rating(5).unwrap(), 5);
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-3).is_err());
    }

    #[test]
    fn registration_requires_password() {
        assert!(validate_registration("bob", "").is_err());
        assert_eq!(validate_registration("Bob", "pw").unwrap(), "bob");
    }
}
