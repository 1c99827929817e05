//! Structured error types for the rowgrid engine.
//!
//! Build-time problems (bad rows, bad configuration) surface from the call
//! that caused them. Render-time problems abort `generate` as a single
//! [`GridError::RenderFailure`] pointing at the first failing row.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type returned by all public rowgrid API functions.
#[derive(Debug, Error)]
pub enum GridError {
    /// A row (or one of its columns) failed validation when it was added.
    #[error("Invalid row: {reason}")]
    InvalidRow { reason: String },

    /// A page size name that is neither a known size nor `custom`.
    #[error("Unknown page size: {0:?}")]
    UnknownPageSize(String),

    /// A configuration option was rejected by the builder.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A build or generate call after the document was already generated.
    #[error("Document already finalized; create a new engine to build another document")]
    DocumentFinalized,

    /// A content block renderer failed. Page and row are 1-based.
    #[error("Render failure on page {page}, row {row}: {cause}")]
    RenderFailure {
        page: usize,
        row: usize,
        #[source]
        cause: BlockError,
    },

    /// The encoder could not produce the output document.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Persisting output failed.
    #[error("Failed to write {}: {source}", path.display())]
    IOFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON input failed to parse as a rowgrid document.
    #[error("Failed to parse document: {source}{}", hint_suffix(hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl GridError {
    pub(crate) fn invalid_row(reason: impl Into<String>) -> Self {
        GridError::InvalidRow {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for GridError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the rowgrid document schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input, is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        GridError::Parse { source: e, hint }
    }
}

/// Why a single content block could not be rendered.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("image: {0}")]
    Image(String),

    #[error("barcode: {0}")]
    Barcode(String),

    #[error("qrcode: {0}")]
    QrCode(String),

    /// A property combination the renderer cannot honour.
    #[error("invalid properties: {0}")]
    InvalidProps(String),

    /// Raised by custom renderers.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_failure_message_locates_row() {
        let err = GridError::RenderFailure {
            page: 2,
            row: 5,
            cause: BlockError::Image("Unsupported image format".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("page 2"));
        assert!(msg.contains("row 5"));
        assert!(msg.contains("Unsupported image format"));
    }

    #[test]
    fn test_parse_error_carries_hint() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ \"a\": ").unwrap_err();
        let err = GridError::from(json_err);
        assert!(err.to_string().contains("Hint"));
    }
}
