//! Rendering a resolved document back to text.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use std::str::FromStr;
//! use swaggerfold_core::output::{render, OutputFormat};
//!
//! let format = OutputFormat::from_str("yaml").unwrap();
//! assert_eq!(format.to_string(), "yaml");
//!
//! let text = render(&json!({"swagger": "2.0"}), OutputFormat::Json, false).unwrap();
//! assert_eq!(text, r#"{"swagger":"2.0"}"#);
//! ```

// Internal imports (std, crate)
use std::fmt;
use std::str::FromStr;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl OutputFormat {
    /// Returns the format identifier as a string slice
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// Guess the format from a file name, by extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a document in the given format.
///
/// YAML output is always block style, so `pretty` only affects JSON.
pub fn render(document: &JsonValue, format: OutputFormat, pretty: bool) -> crate::Result<String> {
    let text = match (format, pretty) {
        (OutputFormat::Json, true) => serde_json::to_string_pretty(document)?,
        (OutputFormat::Json, false) => serde_json::to_string(document)?,
        (OutputFormat::Yaml, _) => serde_yaml::to_string(document)?,
    };
    Ok(text)
}
