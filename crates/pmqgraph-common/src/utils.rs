//! Utility functions used across the pmqgraph workspace

use crate::error::{PmqGraphError, Result};
use chrono::NaiveDate;

/// Date formats accepted in tracker column headers and API payloads
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a date string in any of the accepted formats
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(PmqGraphError::validation_field(
        format!("'{}' is not a recognized date", trimmed),
        "date",
    ))
}

/// Format a date for axis labels and filenames
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Validate that a string is not empty after trimming
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(PmqGraphError::validation_field(
            format!("{} cannot be empty", field_name),
            field_name,
        ))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
        assert_eq!(parse_date("2025-01-29").unwrap(), expected);
        assert_eq!(parse_date("29/01/2025").unwrap(), expected);
        assert_eq!(parse_date(" 29-01-2025 ").unwrap(), expected);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("not a date").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 9).unwrap();
        assert_eq!(format_date(&date), "2020-03-09");
    }

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("test", "field").is_ok());
        assert!(validate_non_empty("", "field").is_err());
        assert!(validate_non_empty("   ", "field").is_err());
    }
}
