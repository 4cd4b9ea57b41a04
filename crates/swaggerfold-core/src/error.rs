//! Error handling for the swaggerfold resolution library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. It uses `thiserror` for easy
//! error handling and implements conversions from common error types.
//!
//! Only fatal conditions are errors. Problems that drop a single unit of the
//! output (a parameter, a path, a definition) are reported as
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s instead.
//!
//! # Examples
//!
//! ```
//! use swaggerfold_core::error::{Error, Result};
//!
//! fn check_version(version: &str) -> Result<()> {
//!     if version != "2.0" {
//!         return Err(Error::specification("unsupported swagger version"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_version("1.2").is_err());
//! ```

use thiserror::Error;

/// Result type for swaggerfold operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for swaggerfold operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The document is not a usable Swagger 2.0 specification
    #[error("Specification error: {0}")]
    Specification(String),

    /// The document could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new specification error
    pub fn specification<S: Into<String>>(msg: S) -> Self {
        Self::Specification(msg.into())
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(msg: S) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error comes from the document itself rather than from I/O.
    pub fn is_specification(&self) -> bool {
        matches!(self, Self::Specification(_))
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Self::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specification_display() {
        let err = Error::specification("missing paths");
        assert_eq!(err.to_string(), "Specification error: missing paths");
        assert!(err.is_specification());
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(!err.is_specification());
    }
}
