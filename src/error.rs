//! Structured error types for the print engine.
//!
//! Parsing, image decoding, rasterization and PDF output fail in distinct
//! ways; the editor adds the property and lookup errors it can raise.

use thiserror::Error;

/// The unified error type returned by all public clinic-print functions.
#[derive(Debug, Error)]
pub enum PrintError {
    /// JSON input failed to parse as a template, settings or patient record.
    #[error("Failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// An image could not be read or decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// The composed page could not be captured to a bitmap.
    #[error("Raster error: {0}")]
    Raster(String),

    /// PDF serialization failed.
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings store could not load or save.
    #[error("Store error: {0}")]
    Store(String),

    /// A property change was applied to an element kind it doesn't belong to.
    #[error("Property '{property}' does not apply to {kind} elements")]
    InvalidProperty {
        property: &'static str,
        kind: &'static str,
    },

    #[error("No element with id '{0}'")]
    ElementNotFound(String),

    /// An export is already running on this exporter.
    #[error("An export is already in progress")]
    Busy,
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for PrintError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected shape. Check field names and element types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PrintError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_hint() {
        let err: PrintError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse input"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn test_eof_hint() {
        let err: PrintError = serde_json::from_str::<serde_json::Value>("{\"a\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_invalid_property_message() {
        let err = PrintError::InvalidProperty {
            property: "dataLayout",
            kind: "text",
        };
        assert_eq!(
            err.to_string(),
            "Property 'dataLayout' does not apply to text elements"
        );
    }
}
