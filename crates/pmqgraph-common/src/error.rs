//! Error types and utilities for pmqgraph

use thiserror::Error;

/// Result type alias for pmqgraph operations
pub type Result<T> = std::result::Result<T, PmqGraphError>;

/// Main error type for pmqgraph operations
#[derive(Error, Debug)]
pub enum PmqGraphError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network related errors (HTTP requests, etc.)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// TheyWorkForYou API related errors
    #[error("TheyWorkForYou API error: {message}")]
    Twfy {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A required column is missing or unparseable in the input data
    #[error("Schema error: missing or invalid column '{column}'{}", .table.as_deref().map(|t| format!(" in table '{t}'")).unwrap_or_default())]
    Schema {
        column: String,
        table: Option<String>,
    },

    /// A named table lookup failed; no silent default is substituted
    #[error("Table '{name}' not found; available tables: {}", .available.join(", "))]
    TableNotFound { name: String, available: Vec<String> },

    /// The requested facet grid has fewer cells than panels to place
    #[error("Layout error: grid provides {available} cells but {required} are required")]
    Layout { required: usize, available: usize },

    /// PMQ session extraction failed a structural check
    #[error("Extraction error: {message}")]
    Extraction { message: String },

    /// Chart rendering errors
    #[error("Chart error: {message}")]
    Chart {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV reading errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Validation errors for user input or data
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PmqGraphError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new TheyWorkForYou API error
    pub fn twfy(msg: impl Into<String>) -> Self {
        Self::Twfy {
            message: msg.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new TheyWorkForYou API error with HTTP status code
    pub fn twfy_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Twfy {
            message: msg.into(),
            status_code: Some(status),
            source: None,
        }
    }

    /// Create a new schema error for a missing or invalid column
    pub fn schema(column: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
            table: None,
        }
    }

    /// Create a new schema error naming the table it was found in
    pub fn schema_in_table(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
            table: Some(table.into()),
        }
    }

    /// Create a new table-not-found error listing the available tables
    pub fn table_not_found(name: impl Into<String>, available: Vec<String>) -> Self {
        Self::TableNotFound {
            name: name.into(),
            available,
        }
    }

    /// Create a new layout error from required and available cell counts
    pub fn layout(required: usize, available: usize) -> Self {
        Self::Layout {
            required,
            available,
        }
    }

    /// Create a new extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    /// Create a new chart error
    pub fn chart(msg: impl Into<String>) -> Self {
        Self::Chart {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new chart error with source
    pub fn chart_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Chart {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }
}

// Error conversion implementations for external types

/// Convert from reqwest::Error to PmqGraphError
impl From<reqwest::Error> for PmqGraphError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_status() {
            let status_code = err.status().map(|s| s.as_u16()).unwrap_or(0);
            Self::network_with_source(format!("HTTP error: {}", status_code), err)
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}

#[cfg(feature = "plotters")]
/// Convert from plotters drawing errors to PmqGraphError
impl<T> From<plotters::drawing::DrawingAreaErrorKind<T>> for PmqGraphError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        Self::chart_with_source("Chart rendering failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let error = PmqGraphError::new("test message");
        assert!(error.to_string().contains("test message"));

        let config_error = PmqGraphError::config("config issue");
        assert!(config_error.to_string().contains("Configuration error"));
        assert!(config_error.to_string().contains("config issue"));

        let twfy_error = PmqGraphError::twfy_with_status("Server error", 500);
        assert!(twfy_error.to_string().contains("TheyWorkForYou API error"));
        assert!(twfy_error.to_string().contains("Server error"));

        let validation_error = PmqGraphError::validation_field("Invalid input", "issues");
        assert!(validation_error.to_string().contains("Validation error"));
        assert!(validation_error.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_schema_error_names_column_and_table() {
        let bare = PmqGraphError::schema("Issue");
        assert_eq!(
            bare.to_string(),
            "Schema error: missing or invalid column 'Issue'"
        );

        let with_table = PmqGraphError::schema_in_table("Percentage", "All_adults");
        assert!(with_table.to_string().contains("'Percentage'"));
        assert!(with_table.to_string().contains("'All_adults'"));
    }

    #[test]
    fn test_layout_error_reports_both_counts() {
        let error = PmqGraphError::layout(6, 5);
        let text = error.to_string();
        assert!(text.contains("5 cells"));
        assert!(text.contains("6 are required"));
    }

    #[test]
    fn test_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let wrapped_error = PmqGraphError::with_source("Failed to read file", io_error);

        assert!(wrapped_error.to_string().contains("Failed to read file"));
        assert!(wrapped_error.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let converted: PmqGraphError = io_error.into();

        assert!(converted.to_string().contains("I/O error"));
        assert!(converted.source().is_some());
    }

    #[test]
    fn test_serde_error_conversion() {
        let invalid_json = r#"{"invalid": json}"#;
        let serde_error = serde_json::from_str::<serde_json::Value>(invalid_json).unwrap_err();
        let converted: PmqGraphError = serde_error.into();

        assert!(converted.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<String> {
            Ok("success".to_string())
        }

        fn returns_error() -> Result<String> {
            Err(PmqGraphError::new("failure"))
        }

        assert!(returns_result().is_ok());
        assert!(returns_error().is_err());
    }

    #[test]
    fn test_error_chain_preservation() {
        let root_error = io::Error::new(io::ErrorKind::NotFound, "Root cause");
        let middle_error = PmqGraphError::config_with_source("Middle layer", root_error);
        let top_error = PmqGraphError::with_source("Top layer", middle_error);

        assert!(top_error.to_string().contains("Top layer"));

        let mut current_error: &dyn std::error::Error = &top_error;
        let mut error_count = 0;

        while let Some(source) = current_error.source() {
            current_error = source;
            error_count += 1;
        }

        assert!(error_count >= 2);
    }
}
