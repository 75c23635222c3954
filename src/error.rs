// In: src/error.rs

//! This module defines the single, unified error type for the entire taq-stream library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Only fatal conditions live here. A malformed declared row count in a file header
//! and an unrecognized message tag are recovered where they occur and are logged,
//! never returned.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaqError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    /// No prefix of the field-width table sums to the detected line width.
    #[error("Can't map fields onto a physical line width of {line_width} bytes")]
    LayoutMismatch { line_width: usize },

    /// The tagged feed ended in the middle of a frame (or of its length prefix).
    #[error("Truncated frame: expected {expected} bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },

    /// The final block of a fixed-width file was not a whole number of lines.
    #[error("Block of {block_len} bytes is not a multiple of the {line_width}-byte line width")]
    MisalignedBlock { block_len: usize, line_width: usize },

    /// The first line of a fixed-width file carries no usable date.
    #[error("Invalid file header: {0}")]
    InvalidHeader(String),

    /// A recognized message tag whose payload does not match its layout length.
    #[error("Malformed message '{tag}': layout expects {expected} bytes, frame has {actual}")]
    MalformedMessage {
        tag: char,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field '{field}' is {expected} bytes wide, got a {actual}-byte value")]
    FieldWidth {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported archive: {0}")]
    UnsupportedArchive(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem. Never retried.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error reading the central directory of a zip archive.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error from the Serde JSON library, typically while loading a config.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl TaqError {
    /// Returns `true` for errors raised while reading file bytes, as opposed to
    /// configuration or column-lookup mistakes made by the caller.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::LayoutMismatch { .. }
                | Self::TruncatedFrame { .. }
                | Self::MisalignedBlock { .. }
                | Self::InvalidHeader(_)
                | Self::MalformedMessage { .. }
                | Self::Io(_)
                | Self::Zip(_)
        )
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

/// Lets a `TaqError` flow out through Arrow's `RecordBatchReader` iterator.
impl From<TaqError> for arrow::error::ArrowError {
    fn from(err: TaqError) -> Self {
        match err {
            TaqError::Arrow(inner) => inner,
            TaqError::Io(inner) => arrow::error::ArrowError::IoError(inner.to_string(), inner),
            other => arrow::error::ArrowError::ExternalError(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_failures_are_told_apart_from_caller_mistakes() {
        assert!(TaqError::MisalignedBlock { block_len: 10, line_width: 98 }.is_decode_failure());
        assert!(TaqError::TruncatedFrame { expected: 2, actual: 1 }.is_decode_failure());
        assert!(TaqError::InvalidHeader("bad date".to_string()).is_decode_failure());
        assert!(!TaqError::UnknownField("Symbol".to_string()).is_decode_failure());
        assert!(!TaqError::InvalidConfig("batch".to_string()).is_decode_failure());
    }

    #[test]
    fn test_into_arrow_error_keeps_arrow_errors() {
        let arrow_err = arrow::error::ArrowError::ComputeError("boom".to_string());
        let round = arrow::error::ArrowError::from(TaqError::Arrow(arrow_err));
        assert!(matches!(round, arrow::error::ArrowError::ComputeError(_)));

        let external = arrow::error::ArrowError::from(TaqError::UnknownField("x".to_string()));
        assert!(matches!(external, arrow::error::ArrowError::ExternalError(_)));
    }
}
